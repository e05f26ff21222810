//! In-memory vector store implementation.
//!
//! Brute-force cosine search; one store holds one video's chunks.

use super::{cosine_similarity, Document, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with documents.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().map(|d| (d.id, d)).collect()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().await;
        for doc in docs {
            store.insert(doc.id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().await;

        let mut results: Vec<SearchResult> = docs
            .values()
            .map(|doc| SearchResult {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn documents(&self) -> Result<Vec<Document>> {
        let docs = self.documents.read().await;
        let mut result: Vec<Document> = docs.values().cloned().collect();
        result.sort_by_key(|d| d.chunk_order);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.read().await.len())
    }

    async fn clear(&self) -> Result<()> {
        self.documents.write().await.clear();
        Ok(())
    }
}
