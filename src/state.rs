//! Per-bot run state persisted in `<workdir>/state.json`.
//!
//! The state maps each followed user's DID to the key of the newest post
//! already liked for them. It is loaded once per run, mutated in memory and
//! written back once with a write-then-rename so a crash never leaves a
//! half-written file behind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the persisted state inside the working directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Suffix of the temporary file written before the atomic rename.
const TMP_SUFFIX: &str = ".tmp";

/// Error type for state persistence.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem error while writing or renaming the state file.
    #[error("Failed to write state file: {0}")]
    Io(#[from] io::Error),
    /// The in-memory state could not be serialised.
    #[error("Failed to serialise state: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Newest liked post for one followed user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    /// Record key of the newest post liked so far.
    #[serde(default)]
    pub last_seen_rkey: String,
    /// Keys written by other tools or newer versions, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Watermark {
    /// Create a watermark at the given post key.
    pub fn new(last_seen_rkey: impl Into<String>) -> Self {
        Self {
            last_seen_rkey: last_seen_rkey.into(),
            extra: Map::new(),
        }
    }
}

/// The persisted aggregate for one bot instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Watermarks keyed by follower DID.
    #[serde(default)]
    pub followers: BTreeMap<String, Watermark>,
    /// Unrecognised top-level keys, round-tripped on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunState {
    /// Last liked post key for `did`, or `""` if the user was never processed.
    pub fn last_seen(&self, did: &str) -> &str {
        self.followers
            .get(did)
            .map(|w| w.last_seen_rkey.as_str())
            .unwrap_or("")
    }

    /// Move the watermark for `did` forward to `rkey`.
    ///
    /// Empty keys and keys that do not sort after the stored one are ignored,
    /// so a watermark never moves backwards. Returns whether it changed.
    pub fn advance(&mut self, did: &str, rkey: &str) -> bool {
        if rkey.is_empty() || rkey <= self.last_seen(did) {
            return false;
        }
        self.followers
            .entry(did.to_string())
            .or_default()
            .last_seen_rkey = rkey.to_string();
        true
    }

    /// Number of followers with a stored watermark.
    #[must_use]
    pub fn len(&self) -> usize {
        self.followers.len()
    }

    /// Whether no watermark has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.followers.is_empty()
    }
}

/// Reads and atomically writes the state file of one working directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Open the store for `workdir`, creating the directory if needed.
    pub fn open(workdir: &Path) -> Result<Self, StateError> {
        fs::create_dir_all(workdir)?;
        Ok(Self::at(workdir.join(STATE_FILE_NAME)))
    }

    /// Use an explicit state file path without touching the filesystem.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the canonical state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(TMP_SUFFIX);
        PathBuf::from(name)
    }

    /// Load the persisted state.
    ///
    /// A missing, unreadable or corrupt file yields an empty state.
    pub fn load(&self) -> RunState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                return RunState::default();
            }
            Err(e) => {
                warn!("Cannot read state file {}: {e}", self.path.display());
                return RunState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring corrupt state file {}: {e}", self.path.display());
                RunState::default()
            }
        }
    }

    /// Persist `state`, replacing the previous file atomically.
    pub fn save(&self, state: &RunState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_vec(state)?;
        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!(
            "Saved {} watermark(s) to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> RunState {
        let mut state = RunState::default();
        state.advance("did:plc:alice", "3kabc");
        state.advance("did:plc:bob", "3kxyz");
        state
    }

    #[test]
    fn test_open_creates_workdir() {
        let temp = TempDir::new().unwrap();
        let workdir = temp.path().join("bots/BOT1");

        let store = StateStore::open(&workdir).unwrap();

        assert!(workdir.is_dir());
        assert_eq!(store.path(), workdir.join("state.json"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        assert_eq!(store.load(), RunState::default());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        fs::write(store.path(), "{\"followers\": {\"did:plc:a\": ").unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_wrong_shape_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        let state = sample_state();

        store.save(&state).unwrap();

        assert_eq!(store.load(), state);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_saved_file_shape() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        store.save(&sample_state()).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw["followers"]["did:plc:alice"]["last_seen_rkey"],
            Value::String("3kabc".into())
        );
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        fs::write(
            store.path(),
            r#"{
                "version": 2,
                "followers": {
                    "did:plc:alice": {"last_seen_rkey": "3kaaa", "handle": "alice.test"}
                }
            }"#,
        )
        .unwrap();

        let mut state = store.load();
        assert_eq!(state.last_seen("did:plc:alice"), "3kaaa");
        state.advance("did:plc:alice", "3kbbb");
        store.save(&state).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], Value::from(2));
        assert_eq!(raw["followers"]["did:plc:alice"]["handle"], "alice.test");
        assert_eq!(raw["followers"]["did:plc:alice"]["last_seen_rkey"], "3kbbb");
    }

    #[test]
    fn test_stale_tmp_file_does_not_affect_load() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        let state = sample_state();
        store.save(&state).unwrap();

        // A crash after writing the temp file but before the rename.
        fs::write(store.tmp_path(), "{\"followers\": {\"did:plc:x\": {").unwrap();

        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let temp = TempDir::new().unwrap();
        let store = StateStore::open(temp.path()).unwrap();
        let state = sample_state();
        store.save(&state).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        // Block the temp path so the write fails before the rename.
        fs::create_dir_all(store.tmp_path()).unwrap();
        let mut next = state.clone();
        next.advance("did:plc:carol", "3kzzz");
        assert!(store.save(&next).is_err());

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut state = RunState::default();
        assert!(state.advance("did:plc:a", "3kbbb"));
        assert!(!state.advance("did:plc:a", "3kaaa"));
        assert!(!state.advance("did:plc:a", "3kbbb"));
        assert!(!state.advance("did:plc:a", ""));
        assert_eq!(state.last_seen("did:plc:a"), "3kbbb");
        assert!(state.advance("did:plc:a", "3kccc"));
        assert_eq!(state.last_seen("did:plc:a"), "3kccc");
    }

    #[test]
    fn test_last_seen_defaults_to_empty() {
        assert_eq!(RunState::default().last_seen("did:plc:nobody"), "");
    }
}
