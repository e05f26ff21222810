//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, OpenAISettings};
use crate::error::{Result, TubechatError};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, Embedding, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI has a limit on inputs per request.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings, optionally overriding the API key.
    pub fn from_settings(
        openai: &OpenAISettings,
        embedding: &EmbeddingSettings,
        api_key: Option<&str>,
    ) -> Result<Self> {
        let client = create_client(openai, api_key)?;
        Ok(Self::with_client(
            client,
            &embedding.model,
            embedding.dimensions as usize,
        ))
    }

    /// Create an embedder over an existing client.
    pub fn with_client(client: Client<OpenAIConfig>, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TubechatError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| TubechatError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| TubechatError::from_openai("Embedding API error", e))?;

            all_embeddings.extend(assemble_batch(chunk.len(), response.data)?);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Put one response's embeddings back in input order.
fn assemble_batch(expected: usize, mut data: Vec<Embedding>) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(TubechatError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|e| e.index);
    Ok(data.into_iter().map(|e| e.embedding).collect())
}
