//! Progress tracking and spaced repetition for vocabulary learning
//!
//! This module provides:
//! - Per-word spaced repetition scheduling (stability-based backoff)
//! - Daily activity rows with streaks, freeze tokens and daily goals
//! - XP economy with streak multipliers and a level curve
//! - The orchestrator tying them together over JSON-file storage

pub mod economy;
pub mod models;
pub mod srs;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use models::*;
pub use storage::{ProgressStore, ProgressStoreError};
pub use tracker::ProgressTracker;
