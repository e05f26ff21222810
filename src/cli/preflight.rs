//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TubechatError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing and asking require an API key.
    Ask,
    /// Fetching a transcript needs no credentials.
    Transcript,
    /// The web UI accepts a key from the form, so a missing key only warns.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_api_key(settings)?;
            check_retrieval(settings)?;
        }
        Operation::Serve => check_retrieval(settings)?,
        Operation::Transcript => {}
    }
    check_chunking(settings)
}

/// Whether an API key is configured.
pub fn has_api_key(settings: &Settings) -> bool {
    settings.api_key().is_some()
}

fn check_api_key(settings: &Settings) -> Result<()> {
    if has_api_key(settings) {
        Ok(())
    } else {
        Err(TubechatError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...' or add it to a .env file"
                .to_string(),
        ))
    }
}

fn check_retrieval(settings: &Settings) -> Result<()> {
    if settings.retrieval.k == 0 {
        return Err(TubechatError::Config(
            "Invalid retrieval settings: k must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn check_chunking(settings: &Settings) -> Result<()> {
    let chunking = &settings.chunking;
    if chunking.chunk_size == 0 || chunking.chunk_overlap >= chunking.chunk_size {
        return Err(TubechatError::Config(format!(
            "Invalid chunking settings: size {} with overlap {}",
            chunking.chunk_size, chunking.chunk_overlap
        )));
    }
    Ok(())
}
