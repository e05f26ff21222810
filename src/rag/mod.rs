//! RAG (Retrieval-Augmented Generation) for question answering.
//!
//! Retrieves the transcript chunks closest to a question and hands them to
//! a chat model as context.

pub mod context;
mod generator;
mod response;

pub use context::ContextBuilder;
pub use generator::{Generator, OpenAIGenerator};
pub use response::{RagEngine, RagResponse};

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Video ID.
    pub video_id: String,
    /// Formatted timestamp (e.g., "02:34").
    pub timestamp: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// URL with timestamp.
    pub url: Option<String>,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            timestamp: result.document.format_timestamp(),
            video_id: result.document.video_id,
            start_seconds: result.document.start_seconds,
            content: result.document.content,
            score: result.score,
            url: None,
        }
    }
}
