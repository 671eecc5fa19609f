//! XP rewards and the leveling curve.
//!
//! Action rewards are multiplied by a capped streak multiplier; flat bonuses
//! (daily goal, streak milestones, first session) never are, to avoid
//! runaway compounding. Levels come from a fixed monotonic threshold table
//! over lifetime XP.

use serde::{Deserialize, Serialize};

/// Base XP for viewing a word card
pub const XP_WORD_VIEW: i64 = 2;
/// Base XP for a successful passive recall
pub const XP_RECALL_SUCCESS: i64 = 10;
/// Base XP for a successful active production
pub const XP_PRACTICE_SUCCESS: i64 = 15;
/// Base XP awarded when a word reaches MASTERED
pub const XP_WORD_MASTERED: i64 = 25;
/// Flat bonus for meeting the daily goal
pub const XP_DAILY_GOAL_BONUS: i64 = 50;
/// Flat bonus for the first session of a day
pub const XP_FIRST_SESSION_BONUS: i64 = 5;

/// Multiplier growth per streak day
const MULTIPLIER_STEP: f32 = 0.05;
/// Reward multiplier cap
const MULTIPLIER_CAP: f32 = 2.0;

/// Streak reward multiplier: 1.0 at streak 0, +5% per streak day, capped
pub fn streak_multiplier(streak: u32) -> f32 {
    (1.0 + streak as f32 * MULTIPLIER_STEP).min(MULTIPLIER_CAP)
}

/// XP awarded for a base reward at a given streak
pub fn apply_multiplier(base_xp: i64, streak: u32) -> i64 {
    (base_xp as f32 * streak_multiplier(streak)).floor() as i64
}

/// Lifetime XP required to reach each level; index 0 is level 1
const LEVEL_THRESHOLDS: &[i64] = &[
    0, 100, 250, 450, 700, 1_000, 1_400, 1_900, 2_500, 3_200,
    4_000, 5_000, 6_200, 7_600, 9_200, 11_000, 13_000, 15_500, 18_500, 22_000,
    26_000, 30_500, 35_500, 41_000, 47_000, 54_000, 62_000, 71_000, 81_000, 92_000,
];

/// A learner's level derived from lifetime XP
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLevel {
    /// Ordinal level, starting at 1
    pub level: u32,
    /// Fractional progress toward the next level, in [0, 1)
    pub progress: f32,
    /// XP still needed for the next level; 0 at the table's top level
    pub xp_to_next: i64,
}

impl UserLevel {
    pub fn from_xp(total_xp: i64) -> Self {
        let total = total_xp.max(0);

        let mut index = 0;
        for (i, threshold) in LEVEL_THRESHOLDS.iter().enumerate() {
            if total >= *threshold {
                index = i;
            } else {
                break;
            }
        }

        let level = (index + 1) as u32;
        if index + 1 >= LEVEL_THRESHOLDS.len() {
            return Self { level, progress: 0.0, xp_to_next: 0 };
        }

        let current = LEVEL_THRESHOLDS[index];
        let next = LEVEL_THRESHOLDS[index + 1];
        let progress = (total - current) as f32 / (next - current) as f32;

        Self {
            level,
            progress,
            xp_to_next: next - total,
        }
    }
}
