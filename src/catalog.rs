//! Vocabulary catalog interface.
//!
//! The engine does not own word metadata; an external catalog supplies the
//! popularity rank and corpus frequency the scheduler needs. Word ids are
//! opaque strings chosen by the catalog.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Difficulty/popularity metadata for a vocabulary item
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMeta {
    /// Popularity rank, lower = more common
    pub rank: u32,
    /// Corpus frequency bucket
    pub frequency: u32,
}

/// Lookup interface implemented by the embedding application
pub trait WordCatalog: Send + Sync {
    /// Metadata for a word, or None if the catalog doesn't know it
    fn lookup(&self, word_id: &str) -> Option<WordMeta>;
}

/// In-memory catalog backed by a map, with an optional fallback for unknown
/// words. Used by the CLI and tests; real deployments wrap their dictionary.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, WordMeta>,
    fallback: Option<WordMeta>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog that answers every unknown lookup with the same metadata
    pub fn with_fallback(meta: WordMeta) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: Some(meta),
        }
    }

    pub fn insert(&mut self, word_id: impl Into<String>, meta: WordMeta) {
        self.entries.insert(word_id.into(), meta);
    }

    pub fn set_fallback(&mut self, meta: WordMeta) {
        self.fallback = Some(meta);
    }

    /// Load entries from a JSON file mapping word id -> metadata
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let entries: HashMap<String, WordMeta> = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self {
            entries,
            fallback: None,
        })
    }
}

impl WordCatalog for StaticCatalog {
    fn lookup(&self, word_id: &str) -> Option<WordMeta> {
        self.entries.get(word_id).copied().or(self.fallback)
    }
}
