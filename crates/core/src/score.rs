//! Leaderboard and player profile persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::outcome::Outcome;

/// Root directory under `~/.config` used for persisted data.
pub const DEFAULT_DATA_DIR: &str = "matchtui";

/// File name of the leaderboard table.
pub const SCORES_FILE: &str = "scores.json";

/// File name of the remembered player profile.
pub const PROFILE_FILE: &str = "profile.json";

/// One finished session on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Player name as entered on the entry form.
    pub name: String,
    /// Player institution as entered on the entry form.
    pub institution: String,
    /// Player email; older tables may lack it.
    #[serde(default)]
    pub email: String,
    /// Completion time in whole milliseconds.
    pub time: u64,
    /// Classified result of the session.
    pub result: Outcome,
    /// Timestamp when the session finished.
    pub date: DateTime<Utc>,
}

/// Identity captured by the entry form and remembered between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Institution or team.
    pub institution: String,
}

impl PlayerProfile {
    /// Placeholder identity used when the form is skipped.
    pub fn anonymous() -> Self {
        Self {
            name: "N/A".to_string(),
            email: "N/A".to_string(),
            institution: "N/A".to_string(),
        }
    }
}

/// Store responsible for the leaderboard table and the player profile.
///
/// The table is cached after the first read and the cache is refreshed
/// on every successful write.
pub struct ScoreStore {
    root: PathBuf,
    cache: RwLock<Option<Vec<ScoreRecord>>>,
}

impl ScoreStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(None),
        }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DATA_DIR)
    }

    /// Root directory this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the leaderboard sorted by completion time, fastest first.
    ///
    /// A missing or unreadable table yields an empty board rather than
    /// an error so the screen always renders.
    pub fn list(&self) -> Vec<ScoreRecord> {
        if let Some(cached) = self.cache.read().as_ref() {
            return cached.clone();
        }
        let records = self.load_records();
        *self.cache.write() = Some(records.clone());
        records
    }

    /// Append a finished session and return the re-sorted board.
    pub fn append(&self, record: ScoreRecord) -> Result<Vec<ScoreRecord>> {
        let mut records = self.list();
        records.push(record);
        records.sort_by_key(|record| record.time);
        self.write_records(&records)?;
        *self.cache.write() = Some(records.clone());
        Ok(records)
    }

    /// Replace the record at `index` and return the re-sorted board.
    pub fn replace_at(&self, index: usize, record: ScoreRecord) -> Result<Vec<ScoreRecord>> {
        let mut records = self.list();
        if index >= records.len() {
            return Err(anyhow!("score index {index} out of range"));
        }
        records[index] = record;
        records.sort_by_key(|record| record.time);
        self.write_records(&records)?;
        *self.cache.write() = Some(records.clone());
        Ok(records)
    }

    /// Delete the record at `index` and return the remaining board.
    pub fn remove_at(&self, index: usize) -> Result<Vec<ScoreRecord>> {
        let mut records = self.list();
        if index >= records.len() {
            return Err(anyhow!("score index {index} out of range"));
        }
        records.remove(index);
        self.write_records(&records)?;
        *self.cache.write() = Some(records.clone());
        Ok(records)
    }

    /// Load the remembered player profile, if one was saved.
    pub fn load_profile(&self) -> Option<PlayerProfile> {
        let path = self.root.join(PROFILE_FILE);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    warn!("Failed to parse profile {:?}: {err}", path);
                    None
                }
            },
            Err(err) => {
                warn!("Failed to read profile {:?}: {err}", path);
                None
            }
        }
    }

    /// Persist the player profile for future runs.
    pub fn save_profile(&self, profile: &PlayerProfile) -> Result<()> {
        let path = self.root.join(PROFILE_FILE);
        let serialised = serde_json::to_vec_pretty(profile)?;
        self.write_atomic(&path, &serialised)
    }

    fn load_records(&self) -> Vec<ScoreRecord> {
        let path = self.root.join(SCORES_FILE);
        if !path.exists() {
            return Vec::new();
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read scores {:?}: {err}", path);
                return Vec::new();
            }
        };
        let mut records: Vec<ScoreRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(err) => {
                warn!("Failed to parse scores {:?}: {err}", path);
                return Vec::new();
            }
        };
        records.sort_by_key(|record| record.time);
        records
    }

    fn write_records(&self, records: &[ScoreRecord]) -> Result<()> {
        let path = self.root.join(SCORES_FILE);
        let serialised = serde_json::to_vec_pretty(records)?;
        self.write_atomic(&path, &serialised)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}
