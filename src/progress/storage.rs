//! Ledger storage for progress entities.
//!
//! Directory structure per learner (external ids are mapped to stable
//! filesystem-safe names with deterministic UUIDv5):
//! ```text
//! <data_dir>/progress/{uuid5(user-id)}/
//! ├── profile.json             # UserProfile
//! ├── days/
//! │   └── {YYYY-MM-DD}.json    # DailyActivity, one row per day
//! ├── words/
//! │   └── {uuid5(word-id)}.json # WordProgress
//! └── events/
//!     └── {YYYY-MM-DD}.jsonl   # append-only XP ledger for the day
//! ```
//!
//! Pure storage, no policy. Missing rows surface as `Ok(None)` or empty
//! vectors; individual unreadable rows are skipped with a warning.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::models::{DailyActivity, UserProfile, WordProgress, XpEvent};

#[derive(Error, Debug)]
pub enum ProgressStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ProgressStoreError>;

/// File-backed store for the four progress entity kinds
pub struct ProgressStore {
    base_path: PathBuf,
}

impl ProgressStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("lexis"))
            .ok_or(ProgressStoreError::DataDirNotFound)
    }

    /// Stable filesystem-safe name for an opaque external id
    fn id_name(id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.base_path.join("progress").join(Self::id_name(user_id))
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("profile.json")
    }

    fn days_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("days")
    }

    fn day_path(&self, user_id: &str, date: NaiveDate) -> PathBuf {
        self.days_dir(user_id).join(format!("{}.json", date))
    }

    fn words_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("words")
    }

    fn word_path(&self, user_id: &str, word_id: &str) -> PathBuf {
        self.words_dir(user_id)
            .join(format!("{}.json", Self::id_name(word_id)))
    }

    fn events_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("events")
    }

    fn events_path(&self, user_id: &str, date: NaiveDate) -> PathBuf {
        self.events_dir(user_id).join(format!("{}.jsonl", date))
    }

    /// Create the directory tree for a learner
    pub fn init_user(&self, user_id: &str) -> Result<()> {
        fs::create_dir_all(self.days_dir(user_id))?;
        fs::create_dir_all(self.words_dir(user_id))?;
        fs::create_dir_all(self.events_dir(user_id))?;
        Ok(())
    }

    // ==================== Profile ====================

    pub fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let path = self.profile_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.init_user(&profile.user_id)?;
        let path = self.profile_path(&profile.user_id);
        fs::write(&path, serde_json::to_string_pretty(profile)?)?;
        Ok(())
    }

    // ==================== Daily activity ====================

    pub fn load_day(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyActivity>> {
        let path = self.day_path(user_id, date);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save_day(&self, activity: &DailyActivity) -> Result<()> {
        self.init_user(&activity.user_id)?;
        let path = self.day_path(&activity.user_id, activity.date);
        fs::write(&path, serde_json::to_string_pretty(activity)?)?;
        Ok(())
    }

    /// All daily activity rows for a learner, oldest first
    pub fn list_days(&self, user_id: &str) -> Result<Vec<DailyActivity>> {
        let dir = self.days_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut days = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<DailyActivity>(&content) {
                Ok(day) => days.push(day),
                Err(e) => {
                    log::warn!("Skipping unreadable day row {:?}: {}", path, e);
                }
            }
        }

        days.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(days)
    }

    // ==================== Word progress ====================

    pub fn load_word(&self, user_id: &str, word_id: &str) -> Result<Option<WordProgress>> {
        let path = self.word_path(user_id, word_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save_word(&self, progress: &WordProgress) -> Result<()> {
        self.init_user(&progress.user_id)?;
        let path = self.word_path(&progress.user_id, &progress.word_id);
        fs::write(&path, serde_json::to_string_pretty(progress)?)?;
        Ok(())
    }

    /// All word progress rows for a learner
    pub fn list_words(&self, user_id: &str) -> Result<Vec<WordProgress>> {
        let dir = self.words_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut words = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<WordProgress>(&content) {
                Ok(word) => words.push(word),
                Err(e) => {
                    log::warn!("Skipping unreadable word row {:?}: {}", path, e);
                }
            }
        }
        Ok(words)
    }

    // ==================== XP ledger ====================

    /// Append an event to the day's ledger file. Events are immutable and
    /// never rewritten.
    pub fn append_event(&self, event: &XpEvent) -> Result<()> {
        self.init_user(&event.user_id)?;
        let path = self.events_path(&event.user_id, event.date);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// All ledger events for a (user, day), in append order
    pub fn read_events(&self, user_id: &str, date: NaiveDate) -> Result<Vec<XpEvent>> {
        let path = self.events_path(user_id, date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<XpEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    log::warn!("Skipping unreadable ledger line in {:?}: {}", path, e);
                }
            }
        }
        Ok(events)
    }
}
