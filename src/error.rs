//! Error types for Tubechat.

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Library-level error type for Tubechat operations.
#[derive(Error, Debug)]
pub enum TubechatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("No transcript found in languages: {0}")]
    NoTranscriptFound(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("No video has been processed yet")]
    NoVideoProcessed,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TubechatError {
    /// Classify an OpenAI client error, with `context` prefixed to the message.
    pub fn from_openai(context: &str, err: OpenAIError) -> Self {
        if let OpenAIError::ApiError(api) = &err {
            let code = api.code.as_deref().unwrap_or_default();
            let kind = api.r#type.as_deref().unwrap_or_default();
            let message = format!("{}: {}", context, api.message);

            if code == "invalid_api_key"
                || (kind == "invalid_request_error" && api.message.contains("API key"))
                || kind == "authentication_error"
            {
                return TubechatError::Authentication(message);
            }
            if code == "rate_limit_exceeded"
                || code == "insufficient_quota"
                || kind == "insufficient_quota"
                || kind == "rate_limit_error"
            {
                return TubechatError::RateLimited(message);
            }
        }
        TubechatError::OpenAI(format!("{}: {}", context, err))
    }

    /// Stable tag for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            TubechatError::Config(_) => "config",
            TubechatError::InvalidInput(_) => "invalid_input",
            TubechatError::TranscriptsDisabled(_) => "transcripts_disabled",
            TubechatError::NoTranscriptFound(_) => "no_transcript_found",
            TubechatError::Transcript(_) => "transcript",
            TubechatError::Chunking(_) => "chunking",
            TubechatError::Embedding(_) => "embedding",
            TubechatError::VectorStore(_) => "vector_store",
            TubechatError::Rag(_) => "rag",
            TubechatError::Authentication(_) => "authentication",
            TubechatError::RateLimited(_) => "rate_limited",
            TubechatError::OpenAI(_) => "openai",
            TubechatError::NoVideoProcessed => "no_video_processed",
            TubechatError::SessionNotFound(_) => "session_not_found",
            TubechatError::Io(_) => "io",
            TubechatError::Json(_) => "json",
            TubechatError::TomlParse(_) => "toml",
            TubechatError::Http(_) => "http",
        }
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            TubechatError::Authentication(_) => {
                "Invalid OpenAI API key. Please check your API key and try again.".to_string()
            }
            TubechatError::RateLimited(_) => {
                "OpenAI API rate limit exceeded. Please try again later.".to_string()
            }
            TubechatError::TranscriptsDisabled(_) => {
                "This video does not have captions available. Please try a different video."
                    .to_string()
            }
            TubechatError::NoTranscriptFound(_) => {
                "No transcript found in the supported languages. Please try a different video."
                    .to_string()
            }
            TubechatError::NoVideoProcessed => {
                "Please process a video before asking questions.".to_string()
            }
            TubechatError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            other => format!("An error occurred: {}", other),
        }
    }
}

/// Result type alias for Tubechat operations.
pub type Result<T> = std::result::Result<T, TubechatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;

    fn api_error(code: Option<&str>, kind: Option<&str>, message: &str) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: message.to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_classifies_invalid_key() {
        let err = TubechatError::from_openai(
            "Embedding API error",
            api_error(Some("invalid_api_key"), Some("invalid_request_error"), "Incorrect API key provided"),
        );
        assert!(matches!(err, TubechatError::Authentication(_)));
        assert_eq!(err.kind(), "authentication");
    }

    #[test]
    fn test_classifies_quota() {
        let err = TubechatError::from_openai(
            "Chat API error",
            api_error(Some("insufficient_quota"), Some("insufficient_quota"), "You exceeded your quota"),
        );
        assert!(matches!(err, TubechatError::RateLimited(_)));
    }

    #[test]
    fn test_other_api_errors_stay_generic() {
        let err = TubechatError::from_openai(
            "Chat API error",
            api_error(Some("model_not_found"), Some("invalid_request_error"), "The model does not exist"),
        );
        assert!(matches!(err, TubechatError::OpenAI(_)));
    }

    #[test]
    fn test_user_messages() {
        assert!(TubechatError::TranscriptsDisabled("abc".into())
            .user_message()
            .contains("captions"));
        assert_eq!(
            TubechatError::InvalidInput("bad".into()).user_message(),
            "Invalid input: bad"
        );
    }
}
