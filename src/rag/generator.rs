//! Chat-completion backends for answer generation.

use crate::config::{OpenAISettings, RagSettings};
use crate::error::{Result, TubechatError};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Trait for text generation given a system and a user prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI chat-completion generator.
pub struct OpenAIGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a generator from settings, optionally overriding the API key.
    pub fn from_settings(
        openai: &OpenAISettings,
        rag: &RagSettings,
        api_key: Option<&str>,
    ) -> Result<Self> {
        let client = create_client(openai, api_key)?;
        Ok(Self::with_client(client, &rag.model, rag.temperature))
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| TubechatError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| TubechatError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TubechatError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubechatError::from_openai("Failed to generate response", e))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TubechatError::Rag("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_from_settings() {
        let openai = OpenAISettings {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let generator =
            OpenAIGenerator::from_settings(&openai, &RagSettings::default(), None).unwrap();
        assert_eq!(generator.model(), "gpt-4o");
    }
}
