//! bsky-autolike - like the new posts of an account's followers.
//!
//! One run logs a bot into a Bluesky (AT Protocol) service, lists the
//! followers of a source account, and likes each follower's posts that are
//! newer than the last one it liked for them. Per-follower watermarks are
//! kept in a JSON state file so repeated runs never like a post twice.
//! Several bots can split the follower list into shards.

#![deny(missing_docs)]

/// Version string from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod client;
pub mod config;
pub mod followers;
pub mod liker;
pub mod logging;
pub mod runner;
pub mod shard;
pub mod state;

// Re-export key types for convenience
pub use client::{ClientError, SocialApi};
pub use config::{BotConfig, ConfigError};
pub use runner::{RetryPolicy, RunController, RunError, RunSummary};
pub use state::{RunState, StateStore};
