//! OpenAI client configuration with sensible defaults.

use crate::config::OpenAISettings;
use crate::error::{Result, TubechatError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client from settings.
///
/// `api_key` overrides whatever key the settings carry.
pub fn create_client(settings: &OpenAISettings, api_key: Option<&str>) -> Result<Client<OpenAIConfig>> {
    let timeout = if settings.timeout_seconds == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        settings.timeout_seconds
    };

    let key = api_key
        .or(settings.api_key.as_deref())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            TubechatError::Config(
                "OpenAI API key is missing. Set OPENAI_API_KEY or openai.api_key in the config file."
                    .to_string(),
            )
        })?;

    let mut config = OpenAIConfig::new().with_api_key(key);
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(timeout))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
