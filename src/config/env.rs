//! Prefixed environment lookup.
//!
//! Every bot shares one `.env` file. Keys are looked up as
//! `<BOT_ID>_<KEY>` first and fall back to the shared `<KEY>`, so
//! `BOT2_APP_PASSWORD` overrides nothing but bot 2's password while
//! `SHARD_TOTAL` applies to every bot.

use std::str::FromStr;

use super::ConfigError;

/// Key lookup with a per-bot prefix.
pub struct EnvSource<F> {
    prefix: String,
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Create a lookup for `bot_id` backed by `lookup`.
    pub fn new(bot_id: &str, lookup: F) -> Self {
        Self {
            prefix: bot_id.to_string(),
            lookup,
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value of `<prefix>_<key>`, else `<key>`. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        self.raw(&format!("{}_{}", self.prefix, key))
            .or_else(|| self.raw(key))
    }

    /// Like [`get`](Self::get) with a default.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, falling back to `default` when unset.
    pub fn parse_or<T: FromStr>(
        &self,
        key: &str,
        default: T,
        expected: &str,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
                expected: expected.to_string(),
            }),
        }
    }
}
