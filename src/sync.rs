//! Best-effort mirror queue for cloud sync of progress commits.
//!
//! After each successful local commit the orchestrator appends a record here.
//! The outbox is fire-and-forget: write failures are logged and dropped, and
//! never roll back or block the local transaction. A sync daemon drains the
//! queue file (JSONL) on its own schedule.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operation mirrored to the sync backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MirrorOperation {
    /// Profile totals or streak state changed
    UpdateProfile { user_id: String },
    /// A daily activity row changed
    UpdateDay { user_id: String, date: NaiveDate },
    /// A word progress row changed
    UpdateWord { user_id: String, word_id: String },
    /// An XP ledger entry was appended
    AppendXpEvent { user_id: String, event_id: Uuid },
}

/// One line of the outbox queue file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRecord {
    pub id: Uuid,
    pub operation: MirrorOperation,
    pub created_at: DateTime<Utc>,
}

/// Append-only outbox backing file
pub struct SyncOutbox {
    path: PathBuf,
}

impl SyncOutbox {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Queue an operation. Never fails: errors are logged and the record is
    /// dropped — the local commit already happened and must stand.
    pub fn emit(&self, operation: MirrorOperation, now: DateTime<Utc>) {
        let record = MirrorRecord {
            id: Uuid::new_v4(),
            operation,
            created_at: now,
        };
        if let Err(e) = self.append(&record) {
            log::warn!("Sync outbox write failed, dropping record: {}", e);
        }
    }

    fn append(&self, record: &MirrorRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let json = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Read all queued records in append order. Unparseable lines are skipped.
    pub fn read_all(&self) -> Vec<MirrorRecord> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { continue };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Ok(record) = serde_json::from_str::<MirrorRecord>(trimmed) {
                records.push(record);
            }
        }
        records
    }
}
