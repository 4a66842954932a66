//! Status command implementation.
//!
//! This module implements the `bsky-autolike status` command for showing
//! what the bot has done so far.

use std::fs;

use crate::cli::GlobalArgs;
use crate::config::ConfigError;
use crate::state::{RunState, StateStore};

/// Result type for status command operations.
pub type StatusCommandResult = Result<(), StatusCommandError>;

/// Error type for status command operations.
#[derive(Debug, thiserror::Error)]
pub enum StatusCommandError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Followers with the newest watermarks first.
pub fn recent_watermarks(state: &RunState, limit: usize) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = state
        .followers
        .iter()
        .map(|(did, mark)| (did.as_str(), mark.last_seen_rkey.as_str()))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(limit);
    entries
}

/// Execute the status command.
pub fn status(global: &GlobalArgs, limit: usize) -> StatusCommandResult {
    let config = global.load_config()?;
    let store = StateStore::at(config.state_file());

    println!("\x1b[1m=== bsky-autolike status ({}) ===\x1b[0m", config.bot_id);
    println!();

    println!("\x1b[1mState\x1b[0m");
    println!("  File: {}", store.path().display());
    if !store.path().exists() {
        println!("  \x1b[33mNo state yet.\x1b[0m Run \x1b[1mbsky-autolike run\x1b[0m first.");
        return Ok(());
    }

    let state = store.load();
    println!("  Followers tracked: {}", state.len());
    println!("  Shard: {}", config.shard);
    println!();

    let recent = recent_watermarks(&state, limit);
    if !recent.is_empty() {
        println!("\x1b[1mRecent watermarks\x1b[0m");
        for (did, rkey) in recent {
            println!("  \x1b[36m{rkey}\x1b[0m  {did}");
        }
        println!();
    }

    if let Ok(log) = fs::read_to_string(config.simple_log()) {
        if let Some(last) = log.lines().last() {
            println!("\x1b[1mLast run\x1b[0m");
            println!("  {last}");
        }
    }

    Ok(())
}
