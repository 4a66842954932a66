//! Bot configuration.
//!
//! Everything is read once at start-up from the process environment
//! (optionally seeded from a shared `.env` file) into an immutable
//! [`BotConfig`] that is passed by reference from then on.

mod env;

pub use env::EnvSource;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::liker::LikerOptions;
use crate::shard::{ShardError, ShardSpec};
use crate::state::STATE_FILE_NAME;

/// Default location of the shared env file.
pub const DEFAULT_ENV_PATH: &str = "/opt/bsky-autolike/.env";
/// Bot identity used when `BOT_ID` is unset.
pub const DEFAULT_BOT_ID: &str = "BOT1";
/// Account whose followers are processed by default.
pub const DEFAULT_SOURCE_HANDLE: &str = "im.from.yt";
/// Default XRPC service.
pub const DEFAULT_SERVICE: &str = "https://bsky.social";
/// Parent of the per-bot working directories.
pub const DEFAULT_WORKDIR_ROOT: &str = "/opt/bsky-autolike";
/// Detailed log file name inside the working directory.
pub const DETAIL_LOG_FILE: &str = "autolike.log";
/// Terse log file name inside the working directory.
pub const SIMPLE_LOG_FILE: &str = "autolike_simple.log";

const DEFAULT_MAX_FOLLOWERS_PER_RUN: u32 = 50;
const DEFAULT_POSTS_PER_USER: u32 = 5;
const DEFAULT_SLEEP_PER_LIKE: f64 = 0.5;
const MAX_POSTS_PER_USER: u32 = 100;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A key is set to something that cannot be used.
    #[error("Invalid value for {key}: {value:?} (expected {expected})")]
    InvalidValue {
        /// Unprefixed key name.
        key: String,
        /// The offending value.
        value: String,
        /// What would have been accepted.
        expected: String,
    },
    /// The shard settings do not describe a valid shard.
    #[error("Invalid shard settings: {0}")]
    Shard(#[from] ShardError),
    /// The env file exists but could not be read.
    #[error("Failed to load env file {}: {source}", path.display())]
    EnvFile {
        /// Path of the env file.
        path: PathBuf,
        /// Underlying dotenv error.
        source: dotenvy::Error,
    },
    /// Identifier or app password is not configured.
    #[error("Missing {key} for {bot_id}")]
    MissingCredential {
        /// Bot whose credentials are missing.
        bot_id: String,
        /// The missing key.
        key: &'static str,
    },
}

/// Load `path` into the process environment.
///
/// Variables that are already set win over the file. Returns `false` when
/// the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// An app password. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The password itself, for the login call only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"***\")")
    }
}

/// Resolved configuration for one bot identity.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot identity, e.g. `BOT1`.
    pub bot_id: String,
    /// Handle or DID whose followers are processed.
    pub source: String,
    /// XRPC service base URL.
    pub service: String,
    /// This bot's slice of the follower list.
    pub shard: ShardSpec,
    /// The bot's own handle.
    pub handle: Option<String>,
    /// Login identifier; defaults to the handle.
    pub identifier: Option<String>,
    /// App password.
    pub password: Option<Secret>,
    /// Directory holding the state file and logs.
    pub workdir: PathBuf,
    /// Followers this shard processes per run.
    pub max_followers_per_run: u32,
    /// Per-user liker tunables.
    pub liker: LikerOptions,
}

impl BotConfig {
    /// Build the configuration for `bot_id` from the process environment.
    pub fn from_env(bot_id: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(bot_id, |key| std::env::var(key).ok())
    }

    /// Build the configuration for `bot_id` from an arbitrary key lookup.
    pub fn from_lookup<F>(bot_id: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_id = bot_id.trim();
        let bot_id = if bot_id.is_empty() { DEFAULT_BOT_ID } else { bot_id };
        let env = EnvSource::new(bot_id, lookup);

        let shard_total = env.parse_or("SHARD_TOTAL", 1u32, "a positive integer")?;
        let shard_index = env.parse_or("SHARD_INDEX", 0u32, "a non-negative integer")?;
        let shard = ShardSpec::new(shard_total, shard_index)?;

        let handle = env.get("HANDLE");
        let identifier = env.get("IDENTIFIER").or_else(|| handle.clone());
        let password = env.get("APP_PASSWORD").map(Secret::new);

        let workdir = env
            .get("WORKDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(DEFAULT_WORKDIR_ROOT).join(bot_id));

        let max_followers_per_run = env.parse_or(
            "MAX_FOLLOWERS_PER_RUN",
            DEFAULT_MAX_FOLLOWERS_PER_RUN,
            "a non-negative integer",
        )?;

        let posts_per_user =
            env.parse_or("POSTS_PER_USER", DEFAULT_POSTS_PER_USER, "an integer from 1 to 100")?;
        if !(1..=MAX_POSTS_PER_USER).contains(&posts_per_user) {
            return Err(ConfigError::InvalidValue {
                key: "POSTS_PER_USER".to_string(),
                value: posts_per_user.to_string(),
                expected: "an integer from 1 to 100".to_string(),
            });
        }

        let sleep_secs: f64 =
            env.parse_or("SLEEP_PER_LIKE", DEFAULT_SLEEP_PER_LIKE, "seconds as a number")?;
        let sleep_per_like =
            Duration::try_from_secs_f64(sleep_secs).map_err(|_| ConfigError::InvalidValue {
                key: "SLEEP_PER_LIKE".to_string(),
                value: sleep_secs.to_string(),
                expected: "a finite, non-negative number of seconds".to_string(),
            })?;

        Ok(Self {
            bot_id: bot_id.to_string(),
            source: env.get_or("FOLLOWERS_SOURCE_HANDLE", DEFAULT_SOURCE_HANDLE),
            service: env.get_or("BSKY_SERVICE", DEFAULT_SERVICE),
            shard,
            handle,
            identifier,
            password,
            workdir,
            max_followers_per_run,
            liker: LikerOptions {
                posts_per_user,
                sleep_per_like,
            },
        })
    }

    /// Identifier and password, or the first one that is missing.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let missing = |key| ConfigError::MissingCredential {
            bot_id: self.bot_id.clone(),
            key,
        };
        let identifier = self.identifier.as_deref().ok_or_else(|| missing("IDENTIFIER"))?;
        let password = self
            .password
            .as_ref()
            .map(Secret::expose)
            .ok_or_else(|| missing("APP_PASSWORD"))?;
        Ok((identifier, password))
    }

    /// Path of the state file.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.workdir.join(STATE_FILE_NAME)
    }

    /// Path of the detailed log.
    #[must_use]
    pub fn detail_log(&self) -> PathBuf {
        self.workdir.join(DETAIL_LOG_FILE)
    }

    /// Path of the terse log.
    #[must_use]
    pub fn simple_log(&self) -> PathBuf {
        self.workdir.join(SIMPLE_LOG_FILE)
    }

    /// Key/value view for display. The password is shown only as set or not.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
        vec![
            ("BOT_ID", self.bot_id.clone()),
            ("FOLLOWERS_SOURCE_HANDLE", self.source.clone()),
            ("BSKY_SERVICE", self.service.clone()),
            ("SHARD_TOTAL", self.shard.total().to_string()),
            ("SHARD_INDEX", self.shard.index().to_string()),
            ("HANDLE", or_unset(&self.handle)),
            ("IDENTIFIER", or_unset(&self.identifier)),
            (
                "APP_PASSWORD",
                if self.password.is_some() { "(set)" } else { "(not set)" }.to_string(),
            ),
            ("WORKDIR", self.workdir.display().to_string()),
            ("MAX_FOLLOWERS_PER_RUN", self.max_followers_per_run.to_string()),
            ("POSTS_PER_USER", self.liker.posts_per_user.to_string()),
            (
                "SLEEP_PER_LIKE",
                self.liker.sleep_per_like.as_secs_f64().to_string(),
            ),
        ]
    }
}
