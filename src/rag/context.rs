//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::video::VideoRef;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// Builds context from search results for RAG.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
    min_score: Option<f32>,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 4,
            min_score: None,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Set the minimum similarity score threshold. None keeps the top chunks
    /// regardless of score.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = match self.min_score {
            Some(min_score) => {
                self.vector_store
                    .search_with_threshold(&query_embedding, self.max_chunks, min_score)
                    .await?
            }
            None => self.vector_store.search(&query_embedding, self.max_chunks).await?,
        };

        debug!("Retrieved {} chunks", results.len());
        Ok(Self::from_results(results))
    }

    /// Build context from raw search results.
    pub fn from_results(results: Vec<SearchResult>) -> Vec<ContextChunk> {
        results
            .into_iter()
            .map(|r| {
                let url = VideoRef::parse(&r.document.video_id)
                    .ok()
                    .map(|v| v.url_at(r.document.start_seconds));
                let mut chunk = ContextChunk::from(r);
                chunk.url = url;
                chunk
            })
            .collect()
    }
}

/// Join chunk contents for the prompt, separated by blank lines.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
