//! Vector store abstraction for Tubechat.
//!
//! Holds the chunk embeddings of the currently loaded video.

mod memory;

pub use memory::MemoryVectorStore;

use crate::chunking::{format_timestamp, Chunk};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Video ID this document belongs to.
    pub video_id: String,
    /// Text content of this chunk.
    pub content: String,
    /// Byte offset of the chunk in the transcript.
    pub start_offset: usize,
    /// Start time in the video (seconds).
    pub start_seconds: f64,
    /// Order of this chunk in the transcript.
    pub chunk_order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document from a chunk and its embedding.
    pub fn from_chunk(video_id: &str, chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id: video_id.to_string(),
            content: chunk.content,
            start_offset: chunk.start_offset,
            start_seconds: chunk.start_seconds,
            chunk_order: chunk.order,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Format timestamp for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start_seconds)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for the `limit` most similar documents.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// All documents, in chunk order.
    async fn documents(&self) -> Result<Vec<Document>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;

    /// Remove every document.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
