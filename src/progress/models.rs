//! Data models for the progress and spaced-repetition engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mastery state of a word in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KnownState {
    /// Never successfully recalled
    New,
    /// In the initial learning phase
    Learning,
    /// Reliably recalled
    Known,
    /// Retained long-term
    Mastered,
}

impl Default for KnownState {
    fn default() -> Self {
        Self::New
    }
}

impl KnownState {
    /// Next state toward MASTERED (saturating)
    pub fn promoted(self) -> Self {
        match self {
            Self::New => Self::Learning,
            Self::Learning => Self::Known,
            Self::Known => Self::Mastered,
            Self::Mastered => Self::Mastered,
        }
    }

    /// Previous state toward NEW (saturating)
    pub fn demoted(self) -> Self {
        match self {
            Self::New => Self::New,
            Self::Learning => Self::New,
            Self::Known => Self::Learning,
            Self::Mastered => Self::Known,
        }
    }
}

/// Adaptive difficulty bucket for a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

/// One learner profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque id supplied by the identity provider
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Lifetime XP; only ever increases
    #[serde(default)]
    pub total_xp: i64,
    #[serde(default)]
    pub current_streak: u32,
    /// Always >= current_streak
    #[serde(default)]
    pub best_streak: u32,
    /// Tokens that each forgive one missed day
    #[serde(default)]
    pub streak_freezes: u32,
    /// Day key of the most recent bootstrap
    pub last_active_date: Option<NaiveDate>,
    pub daily_goal_xp: i64,
}

impl UserProfile {
    pub fn new(
        user_id: &str,
        now: DateTime<Utc>,
        daily_goal_xp: i64,
        streak_freezes: u32,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            total_xp: 0,
            current_streak: 0,
            best_streak: 0,
            streak_freezes,
            last_active_date: None,
            daily_goal_xp,
        }
    }
}

/// Per-day activity counters for one learner. Exactly one row per
/// (user, day); created lazily on the first action of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub words_viewed: u32,
    #[serde(default)]
    pub recall_success_count: u32,
    #[serde(default)]
    pub recall_fail_count: u32,
    #[serde(default)]
    pub practice_success_count: u32,
    #[serde(default)]
    pub mastered_count: u32,
    #[serde(default)]
    pub session_count: u32,
    #[serde(default)]
    pub total_time_ms: u64,
    #[serde(default)]
    pub total_xp_earned: i64,
    /// Snapshot of the profile's goal at day start
    #[serde(default)]
    pub daily_goal_target: i64,
    /// Set at most once per day, never cleared
    #[serde(default)]
    pub daily_goal_met: bool,
    /// True for a bridged day written when a streak freeze was consumed.
    /// Bridged days keep the streak unbroken but do not count toward it.
    #[serde(default)]
    pub streak_freeze_used: bool,
    pub last_updated_at: DateTime<Utc>,
}

impl DailyActivity {
    pub fn new(user_id: &str, date: NaiveDate, daily_goal_target: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            words_viewed: 0,
            recall_success_count: 0,
            recall_fail_count: 0,
            practice_success_count: 0,
            mastered_count: 0,
            session_count: 0,
            total_time_ms: 0,
            total_xp_earned: 0,
            daily_goal_target,
            daily_goal_met: false,
            streak_freeze_used: false,
            last_updated_at: now,
        }
    }

    /// Row written for a skipped day bridged by a streak freeze
    pub fn frozen(user_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        let mut day = Self::new(user_id, date, 0, now);
        day.streak_freeze_used = true;
        day
    }
}

/// Per-word learning progress for one learner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub user_id: String,
    /// Opaque id supplied by the vocabulary catalog
    pub word_id: String,
    #[serde(default)]
    pub view_count: u32,
    #[serde(default)]
    pub swipe_right_count: u32,
    #[serde(default)]
    pub swipe_left_count: u32,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(default)]
    pub recall_success_count: u32,
    #[serde(default)]
    pub recall_fail_count: u32,
    #[serde(default)]
    pub production_success_count: u32,
    #[serde(default)]
    pub known_state: KnownState,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Estimated memory strength; drives the next-review interval
    #[serde(default)]
    pub stability: f32,
    #[serde(default)]
    pub lapses_count: u32,
    pub last_review: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
}

impl WordProgress {
    pub fn new(user_id: &str, word_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
            view_count: 0,
            swipe_right_count: 0,
            swipe_left_count: 0,
            bookmarked: false,
            recall_success_count: 0,
            recall_fail_count: 0,
            production_success_count: 0,
            known_state: KnownState::New,
            difficulty: Difficulty::Medium,
            stability: 0.0,
            lapses_count: 0,
            last_review: None,
            next_review: None,
        }
    }

    /// Combined recall and production successes, used by the state machine
    pub fn success_count(&self) -> u32 {
        self.recall_success_count + self.production_success_count
    }

    /// Check if the word is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.map_or(false, |due| due <= now)
    }
}

/// Where an XP award came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum XpSource {
    WordView,
    RecallSuccess,
    PracticeSuccess,
    WordMastered,
    StreakMilestone { days: u32 },
    DailyGoalBonus,
    FirstSessionBonus,
}

/// One immutable entry of the append-only XP ledger. The sum of a day's
/// entries equals that day's `total_xp_earned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpEvent {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub source: XpSource,
    pub base_xp: i64,
    /// Streak multiplier applied; 1.0 for flat bonuses
    pub multiplier: f32,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl XpEvent {
    /// Streak-multiplied reward entry
    #[allow(clippy::too_many_arguments)]
    pub fn rewarded(
        user_id: &str,
        date: NaiveDate,
        source: XpSource,
        base_xp: i64,
        multiplier: f32,
        amount: i64,
        word_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            source,
            base_xp,
            multiplier,
            amount,
            word_id: word_id.map(|w| w.to_string()),
            created_at: now,
        }
    }

    /// Flat bonus entry, never multiplied
    pub fn flat(
        user_id: &str,
        date: NaiveDate,
        source: XpSource,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self::rewarded(user_id, date, source, amount, 1.0, amount, None, now)
    }
}

/// Direction of a card swipe reported by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Result summary returned to the caller after a recorded action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    pub base_xp: i64,
    pub streak_multiplier: f32,
    /// Everything awarded by this action, including bonuses it triggered
    pub total_xp_awarded: i64,
    pub new_lifetime_xp: i64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub daily_goal_just_met: bool,
}

/// Read-only dashboard snapshot for the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_xp: i64,
    pub today_xp: i64,
    pub level: u32,
    pub level_progress: f32,
    pub xp_to_next_level: i64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub streak_freezes: u32,
    pub words_viewed: usize,
    pub words_learning: usize,
    pub words_learned: usize,
    pub words_mastered: usize,
    pub words_needing_review: usize,
    pub session_count: u32,
    pub total_time_ms: u64,
    pub days_active: usize,
    pub daily_goal_target: i64,
    pub daily_goal_progress: i64,
    pub daily_goal_met: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_state_promotion_saturates() {
        assert_eq!(KnownState::New.promoted(), KnownState::Learning);
        assert_eq!(KnownState::Known.promoted(), KnownState::Mastered);
        assert_eq!(KnownState::Mastered.promoted(), KnownState::Mastered);
    }

    #[test]
    fn test_known_state_demotion_saturates() {
        assert_eq!(KnownState::Mastered.demoted(), KnownState::Known);
        assert_eq!(KnownState::Learning.demoted(), KnownState::New);
        assert_eq!(KnownState::New.demoted(), KnownState::New);
    }

    #[test]
    fn test_xp_source_tagged_serialization() {
        let json = serde_json::to_string(&XpSource::StreakMilestone { days: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"streakMilestone","days":7}"#);

        let json = serde_json::to_string(&XpSource::RecallSuccess).unwrap();
        assert_eq!(json, r#"{"type":"recallSuccess"}"#);
    }

    #[test]
    fn test_flat_event_has_unit_multiplier() {
        let now = Utc::now();
        let event = XpEvent::flat(
            "u1",
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            XpSource::DailyGoalBonus,
            50,
            now,
        );
        assert_eq!(event.multiplier, 1.0);
        assert_eq!(event.base_xp, event.amount);
        assert!(event.word_id.is_none());
    }

    #[test]
    fn test_word_progress_defaults_deserialize() {
        // Rows written by older app versions may lack newer counters
        let progress: WordProgress = serde_json::from_str(
            r#"{"userId":"u1","wordId":"haus","lastReview":null,"nextReview":null}"#,
        )
        .unwrap();
        assert_eq!(progress.known_state, KnownState::New);
        assert_eq!(progress.difficulty, Difficulty::Medium);
        assert_eq!(progress.stability, 0.0);
    }
}
