//! Prompt templates for Tubechat.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
    /// Answer returned when retrieval finds nothing to ground on.
    pub no_context_answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant.
Answer ONLY from the provided transcript context.
If the context is insufficient, just say you don't know."#
                .to_string(),

            user: r#"{{context}}

Question: {{question}}"#
                .to_string(),

            no_context_answer: "I don't know. The video transcript doesn't contain anything relevant to this question.".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substituted values are never expanded again. Unknown placeholders are
    /// left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER_REGEX
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
