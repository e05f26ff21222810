//! RAG response generation.

use super::context::{format_context_for_prompt, ContextBuilder};
use super::{ContextChunk, Generator};
use crate::config::Prompts;
use crate::error::{Result, TubechatError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// RAG engine for question answering over one video.
pub struct RagEngine {
    context_builder: ContextBuilder,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(context_builder: ContextBuilder, generator: Arc<dyn Generator>) -> Self {
        Self {
            context_builder,
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Ask a single question and get a response.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TubechatError::InvalidInput(
                "Please enter a question".to_string(),
            ));
        }

        info!("Processing question");

        let context_chunks = self.context_builder.build(question).await?;

        if context_chunks.is_empty() {
            return Ok(RagResponse {
                answer: self.prompts.rag.no_context_answer.clone(),
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&context_chunks));

        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let answer = self.generator.generate(&system, &user).await?;

        debug!("Generated response with {} sources", context_chunks.len());

        Ok(RagResponse {
            answer: answer.trim().to_string(),
            sources: context_chunks,
        })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}
