//! Configuration settings for Tubechat.

use crate::error::{Result, TubechatError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub rag: RagSettings,
    pub transcript: TranscriptSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when neither `-v` nor RUST_LOG is given
    /// (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. Falls back to the OPENAI_API_KEY environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Alternative API base URL for OpenAI-compatible providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            timeout_seconds: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Similarity search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per question.
    pub k: usize,
    /// Minimum cosine similarity for a chunk to be used. Unset keeps the top k
    /// whatever their score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { k: 4, min_score: None }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chat model for answer generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
        }
    }
}

/// Transcript retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Language codes to try, in order of preference.
    pub languages: Vec<String>,
    /// Keep HTML formatting tags in transcript text.
    pub preserve_formatting: bool,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            preserve_formatting: false,
        }
    }
}

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Browser sessions kept in memory before the idlest is dropped.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_sessions: 32,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let mut settings = Self::read_file(path)?;
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    fn read_file(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Apply overrides from environment-style variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            if self.openai.api_key.is_none() {
                self.openai.api_key = Some(key);
            }
        }
        if let Some(base) = get("OPENAI_API_BASE") {
            self.openai.api_base = Some(base);
        }
        if let Some(model) = get("LLM_MODEL") {
            self.rag.model = model;
        }
        if let Some(value) = get("LLM_TEMPERATURE") {
            self.rag.temperature = parse_env("LLM_TEMPERATURE", &value)?;
        }
        if let Some(model) = get("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(value) = get("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env("CHUNK_SIZE", &value)?;
        }
        if let Some(value) = get("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_env("CHUNK_OVERLAP", &value)?;
        }
        if let Some(value) = get("RETRIEVAL_K") {
            self.retrieval.k = parse_env("RETRIEVAL_K", &value)?;
        }
        if let Some(lang) = get("DEFAULT_TRANSCRIPT_LANGUAGE") {
            self.transcript.languages = lang
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubechatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubechat")
            .join("config.toml")
    }

    /// The configured API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.openai.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Copy with secrets removed, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.openai.api_key.is_some() {
            copy.openai.api_key = Some("<redacted>".to_string());
        }
        copy
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        TubechatError::Config(format!("Invalid value for {}: {:?}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rag.model, "gpt-4o");
        assert!((settings.rag.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.retrieval.k, 4);
        assert!(settings.retrieval.min_score.is_none());
        assert_eq!(settings.general.log_level, "warn");
        assert_eq!(settings.transcript.languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env_overrides(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("LLM_MODEL", "gpt-4o-mini"),
                ("CHUNK_SIZE", "500"),
                ("CHUNK_OVERLAP", "50"),
                ("RETRIEVAL_K", "6"),
                ("DEFAULT_TRANSCRIPT_LANGUAGE", "de, en"),
            ]))
            .unwrap();

        assert_eq!(settings.api_key(), Some("sk-test"));
        assert_eq!(settings.rag.model, "gpt-4o-mini");
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 50);
        assert_eq!(settings.retrieval.k, 6);
        assert_eq!(settings.transcript.languages, vec!["de", "en"]);
    }

    #[test]
    fn test_config_file_key_wins_over_env() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-file".to_string());
        settings
            .apply_env_overrides(lookup(&[("OPENAI_API_KEY", "sk-env")]))
            .unwrap();
        assert_eq!(settings.api_key(), Some("sk-file"));
    }

    #[test]
    fn test_invalid_env_number() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env_overrides(lookup(&[("CHUNK_SIZE", "lots")]))
            .unwrap_err();
        assert!(matches!(err, TubechatError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.retrieval.k = 7;
        settings.retrieval.min_score = Some(0.3);
        settings.rag.model = "gpt-4.1".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::read_file(Some(&path)).unwrap();
        assert_eq!(loaded.retrieval.k, 7);
        assert_eq!(loaded.retrieval.min_score, Some(0.3));
        assert_eq!(loaded.rag.model, "gpt-4.1");
    }

    #[test]
    fn test_redacted_hides_key() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-secret".to_string());
        let shown = toml::to_string_pretty(&settings.redacted()).unwrap();
        assert!(!shown.contains("sk-secret"));
    }
}
