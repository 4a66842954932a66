//! Config command implementation.
//!
//! Prints the configuration a run would use, after env-file loading and
//! per-bot prefix resolution.

use crate::cli::GlobalArgs;
use crate::config::{BotConfig, ConfigError};

/// Result type for config command operations.
pub type ConfigCommandResult = Result<(), ConfigCommandError>;

/// Error type for config command operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigCommandError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Render `config` as aligned `KEY = value` lines.
pub fn render(config: &BotConfig) -> Vec<String> {
    let fields = config.fields();
    let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(key, value)| format!("{key:<width$} = {value}"))
        .collect()
}

/// Show the resolved configuration.
pub fn config_show(global: &GlobalArgs) -> ConfigCommandResult {
    let config = global.load_config()?;

    println!("\x1b[1m=== bsky-autolike config ({}) ===\x1b[0m", config.bot_id);
    println!("  env file: {}", global.env_file.display());
    println!();
    for line in render(&config) {
        println!("  {line}");
    }

    Ok(())
}
