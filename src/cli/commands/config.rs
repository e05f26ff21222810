//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings.redacted())?;
            println!("{}", content);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }

        ConfigAction::Init { force } => {
            if path.exists() && !force {
                Output::warning(&format!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                ));
                return Ok(());
            }
            Settings::default().save_to(&path)?;
            Output::success(&format!("Wrote default configuration to {}", path.display()));
        }
    }

    Ok(())
}
