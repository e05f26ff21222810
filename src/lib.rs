//! Tubechat - Question answering over YouTube videos
//!
//! Fetches a video's transcript, splits it into overlapping chunks, embeds
//! them into an in-memory vector index, and answers questions using only
//! the retrieved parts of the transcript.
//!
//! # Overview
//!
//! Tubechat allows you to:
//! - Fetch transcripts of YouTube videos from their captions
//! - Ask questions about a video from the terminal
//! - Run a small web UI where each browser session holds one video
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `video` - YouTube URL parsing
//! - `transcript` - Transcript retrieval
//! - `chunking` - Transcript chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity search
//! - `rag` - Retrieval and answer generation
//! - `pipeline` - Video processing coordination
//! - `session` - Per-user conversation state
//!
//! # Example
//!
//! ```rust,no_run
//! use tubechat::config::Settings;
//! use tubechat::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings, None)?;
//!
//!     let processed = pipeline.process_video("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("Indexed {} chunks", processed.chunk_count);
//!
//!     let answer = pipeline.engine_for(&processed).ask("What is this video about?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod session;
pub mod transcript;
pub mod vector_store;
pub mod video;

pub use error::{Result, TubechatError};
