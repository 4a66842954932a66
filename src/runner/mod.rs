//! Run orchestration.
//!
//! One run logs in, walks this shard's followers, likes their new posts and
//! saves the watermarks once at the end. [`RetryPolicy`] wraps whole runs.

mod controller;
mod retry;

use std::fmt;

pub use controller::RunController;
pub use retry::{run_with_retry, RetryExhausted, RetryPolicy};

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::shard::ShardSpec;
use crate::state::StateError;

/// Reasons a run ends early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Credentials are missing.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The provider client could not be created.
    #[error("Failed to create client: {0}")]
    Connect(#[source] ClientError),
    /// Login was rejected or failed.
    #[error("Login failed: {0}")]
    Auth(#[source] ClientError),
    /// The source account could not be resolved.
    #[error("Failed to resolve {source_handle}: {error}")]
    Resolve {
        /// Configured source.
        source_handle: String,
        /// Underlying error.
        #[source]
        error: ClientError,
    },
    /// Listing followers failed.
    #[error("Failed to list followers: {0}")]
    Followers(#[source] ClientError),
    /// The state file could not be written.
    #[error("Failed to save state: {0}")]
    Persist(#[from] StateError),
}

/// Counters for one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Bot that ran.
    pub bot_id: String,
    /// Configured source account.
    pub source: String,
    /// Followers enumerated across all shards.
    pub total_fetched: usize,
    /// Followers owned by this shard.
    pub scanned: usize,
    /// Followers handed to the liker.
    pub processed: usize,
    /// Likes issued.
    pub new_likes: u32,
    /// Shard this run covered.
    pub shard: ShardSpec,
    /// Whether the state file was written.
    pub saved: bool,
}

impl RunSummary {
    /// The line written to the terse log.
    pub fn simple_line(&self) -> String {
        format!(
            "{} | Proc:{} Likes:{} | Shard {}",
            self.bot_id, self.processed, self.new_likes, self.shard
        )
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run done. source={}, total_fetch={}, scanned={}, processed={}, new_likes={}, shard={}",
            self.source,
            self.total_fetched,
            self.scanned,
            self.processed,
            self.new_likes,
            self.shard
        )
    }
}
