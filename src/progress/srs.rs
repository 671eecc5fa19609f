//! Spaced-repetition scheduling.
//!
//! Pure functions mapping a review outcome plus word metadata to the next
//! [`WordProgress`] snapshot. Memory strength is tracked as a scalar
//! `stability`: successes compound it, failures halve it toward a floor, and
//! the review interval grows super-linearly with it so well-known words back
//! off quickly. Rarer words (high rank, low corpus frequency) consolidate
//! more slowly than common ones.
//!
//! No function here performs I/O or can fail; callers supply a valid prior
//! snapshot (creating a default one if absent) and the current time.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::WordMeta;
use crate::config::SrsConfig;

use super::models::{Difficulty, KnownState, WordProgress};

/// Lowest stability a word can fall back to
const STABILITY_FLOOR: f32 = 0.1;
/// Fraction of stability retained after a failed recall
const FAIL_RETENTION: f32 = 0.5;
/// Compounding applied to prior stability on every success
const SUCCESS_GROWTH: f32 = 1.1;
/// Base stability gain for a passive recall success
const RECALL_GAIN: f32 = 1.0;
/// Base stability gain for an active production success
const PRODUCTION_GAIN: f32 = 1.6;
/// Stability floor applied when a word is promoted straight to MASTERED
const MASTERED_STABILITY: f32 = 6.0;
/// Re-test delay after a failed recall, in minutes
const RELEARN_MINUTES: i64 = 10;
/// Interval curve exponent (super-linear backoff)
const INTERVAL_EXPONENT: f32 = 1.4;
/// Longest schedulable interval, in days
const MAX_INTERVAL_DAYS: f32 = 365.0;
/// Lapses after which a MEDIUM word hardens to HARD
const HARD_LAPSES: u32 = 3;
/// Stability at which a HARD word eases back to MEDIUM
const MEDIUM_STABILITY: f32 = 4.0;
/// Stability at which a MEDIUM word eases to EASY
const EASY_STABILITY: f32 = 10.0;
/// Floor of the rarity scaling factor
const MIN_RARITY_FACTOR: f32 = 0.35;
/// Rank at which the rarity damping doubles
const RANK_DAMPING: f32 = 2000.0;
/// Weight of the corpus-frequency boost
const FREQUENCY_BOOST: f32 = 0.05;

/// Stability gain scale for a word. Common words (low rank, high frequency)
/// consolidate at full rate; rare words are damped toward the floor.
fn rarity_factor(meta: &WordMeta) -> f32 {
    let boost = 1.0 + FREQUENCY_BOOST * (meta.frequency as f32).ln_1p();
    let damping = 1.0 + meta.rank as f32 / RANK_DAMPING;
    (boost / damping).clamp(MIN_RARITY_FACTOR, 1.0)
}

/// Review interval for a given stability
pub fn review_interval(stability: f32) -> Duration {
    let days = stability.max(0.0).powf(INTERVAL_EXPONENT).min(MAX_INTERVAL_DAYS);
    let minutes = (days * 24.0 * 60.0) as i64;
    Duration::minutes(minutes.max(RELEARN_MINUTES))
}

/// Apply a successful passive recall
pub fn on_recall_success(
    progress: &WordProgress,
    meta: &WordMeta,
    cfg: &SrsConfig,
    now: DateTime<Utc>,
) -> WordProgress {
    let mut next = progress.clone();
    next.recall_success_count += 1;
    next.stability = next.stability * SUCCESS_GROWTH + RECALL_GAIN * rarity_factor(meta);
    next.known_state = advance_state(next.known_state, next.success_count(), cfg);
    next.difficulty = ease_difficulty(next.difficulty, next.stability);
    next.last_review = Some(now);
    next.next_review = Some(now + review_interval(next.stability));
    next
}

/// Apply a failed recall: one lapse, one state step back (never below NEW),
/// partial forgetting, and a short fixed re-test interval.
pub fn on_recall_fail(progress: &WordProgress, now: DateTime<Utc>) -> WordProgress {
    let mut next = progress.clone();
    next.recall_fail_count += 1;
    next.lapses_count += 1;
    next.known_state = progress.known_state.demoted();
    next.stability = (progress.stability * FAIL_RETENTION).max(STABILITY_FLOOR);
    next.difficulty = harden_difficulty(progress.difficulty, next.lapses_count);
    next.last_review = Some(now);
    next.next_review = Some(now + Duration::minutes(RELEARN_MINUTES));
    next
}

/// Apply a successful active production. Stronger evidence of mastery than
/// passive recall: larger stability gain, and enough production successes
/// promote a KNOWN word straight to MASTERED.
pub fn on_production_success(
    progress: &WordProgress,
    meta: &WordMeta,
    cfg: &SrsConfig,
    now: DateTime<Utc>,
) -> WordProgress {
    let mut next = progress.clone();
    next.production_success_count += 1;
    next.stability = next.stability * SUCCESS_GROWTH + PRODUCTION_GAIN * rarity_factor(meta);
    next.known_state = advance_state(next.known_state, next.success_count(), cfg);
    if next.known_state == KnownState::Known
        && next.production_success_count >= cfg.production_to_mastered
    {
        next.known_state = KnownState::Mastered;
    }
    next.difficulty = ease_difficulty(next.difficulty, next.stability);
    next.last_review = Some(now);
    next.next_review = Some(now + review_interval(next.stability));
    next
}

/// Promote a word straight to MASTERED (explicit user action)
pub fn promote_to_mastered(progress: &WordProgress, now: DateTime<Utc>) -> WordProgress {
    let mut next = progress.clone();
    next.known_state = KnownState::Mastered;
    next.stability = next.stability.max(MASTERED_STABILITY);
    next.last_review = Some(now);
    next.next_review = Some(now + review_interval(next.stability));
    next
}

/// Advance one state step when the per-state success threshold is met
fn advance_state(state: KnownState, successes: u32, cfg: &SrsConfig) -> KnownState {
    let threshold = match state {
        KnownState::New => cfg.new_to_learning,
        KnownState::Learning => cfg.learning_to_known,
        KnownState::Known => cfg.known_to_mastered,
        KnownState::Mastered => return KnownState::Mastered,
    };
    if successes >= threshold {
        state.promoted()
    } else {
        state
    }
}

/// Push difficulty toward HARD as lapses accumulate
fn harden_difficulty(difficulty: Difficulty, lapses: u32) -> Difficulty {
    match difficulty {
        Difficulty::Easy => Difficulty::Medium,
        Difficulty::Medium if lapses >= HARD_LAPSES => Difficulty::Hard,
        other => other,
    }
}

/// Ease difficulty back down as stability recovers
fn ease_difficulty(difficulty: Difficulty, stability: f32) -> Difficulty {
    match difficulty {
        Difficulty::Hard if stability >= MEDIUM_STABILITY => Difficulty::Medium,
        Difficulty::Medium if stability >= EASY_STABILITY => Difficulty::Easy,
        other => other,
    }
}
