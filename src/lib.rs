//! Progress and spaced-repetition engine for the Lexis vocabulary trainer.
//!
//! The engine decides, per learner and per word, when the next review is due,
//! how mastery evolves with each outcome, and how daily engagement (streaks,
//! XP, levels, daily goals) is computed and persisted. UI, network providers
//! and identity live in the application shell; this crate only needs a
//! [`clock::Clock`], a [`catalog::WordCatalog`] and a data directory.
//!
//! The engine itself is synchronous single-threaded logic. Embedders share a
//! [`progress::ProgressTracker`] behind `Arc<Mutex<_>>` and call it from a
//! background context, the same way the desktop shell shares its storages.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod progress;
pub mod sync;

pub use catalog::{StaticCatalog, WordCatalog, WordMeta};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use progress::{
    ActionSummary, DashboardData, ProgressStore, ProgressStoreError, ProgressTracker,
};
