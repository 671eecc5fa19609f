//! Streak computation over active day keys.
//!
//! Pure calendar arithmetic, no I/O. The orchestrator owns freeze-token
//! accounting and persistence; these functions only answer questions about a
//! set of days. Day keys are UTC calendar dates and the walk uses chrono's
//! calendar-safe predecessor, so month, year and leap boundaries are handled.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::clock::previous_day;

/// A streak length with an associated flat bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub days: u32,
    pub bonus_xp: i64,
}

/// Milestone table. Each fires once, on the day the streak first reaches the
/// exact length.
pub const MILESTONES: &[Milestone] = &[
    Milestone { days: 7, bonus_xp: 70 },
    Milestone { days: 14, bonus_xp: 150 },
    Milestone { days: 30, bonus_xp: 400 },
    Milestone { days: 60, bonus_xp: 1_000 },
    Milestone { days: 100, bonus_xp: 2_000 },
    Milestone { days: 365, bonus_xp: 10_000 },
];

/// Count consecutive active days ending at `today`, or at `yesterday` when
/// today has no activity yet (the day isn't over). Duplicate day keys are
/// tolerated. Returns 0 when neither anchor day is active.
pub fn calculate_streak(active_days: &[NaiveDate], today: NaiveDate, yesterday: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = active_days.iter().copied().collect();
    if days.is_empty() {
        return 0;
    }

    let anchor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    let mut cursor = anchor;
    while days.contains(&cursor) {
        streak += 1;
        let prev = previous_day(cursor);
        if prev == cursor {
            break; // calendar floor
        }
        cursor = prev;
    }
    streak
}

/// True when exactly one day was skipped — yesterday missing but the day
/// before it present — and today's session is the first of the day. That is
/// the single case a streak freeze can bridge; at most one freeze per gap.
/// Decrementing the freeze count is the orchestrator's job, never done here.
pub fn should_consume_freeze(
    active_days: &[NaiveDate],
    today: NaiveDate,
    yesterday: NaiveDate,
) -> bool {
    let days: HashSet<NaiveDate> = active_days.iter().copied().collect();
    !days.contains(&today) && !days.contains(&yesterday) && days.contains(&previous_day(yesterday))
}

/// The milestone reached when the streak is exactly this long, if any.
/// Callers invoke this once per day (at day bootstrap), so a milestone cannot
/// re-fire while the streak stays at or above its threshold.
pub fn check_milestone(streak: u32) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|m| m.days == streak)
}
