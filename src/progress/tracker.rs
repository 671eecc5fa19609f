//! Progress orchestration.
//!
//! Coordinates the streak engine, SRS scheduler and XP economy against the
//! ledger store for each user action. Per-action writes apply in a fixed
//! order — word progress, then the day row, then the profile, then the
//! append-only XP ledger — so a crash mid-action under-counts the audit
//! ledger instead of double-crediting totals.
//!
//! The tracker is synchronous single-threaded logic. Embedders share it
//! behind `Arc<Mutex<_>>` and call it off the UI thread; dashboard reads may
//! race writers and return a slightly stale snapshot.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::catalog::WordCatalog;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::sync::{MirrorOperation, SyncOutbox};

use super::economy::{
    apply_multiplier, streak_multiplier, UserLevel, XP_DAILY_GOAL_BONUS, XP_FIRST_SESSION_BONUS,
    XP_PRACTICE_SUCCESS, XP_RECALL_SUCCESS, XP_WORD_MASTERED, XP_WORD_VIEW,
};
use super::models::{
    ActionSummary, DailyActivity, DashboardData, KnownState, SwipeDirection, UserProfile,
    WordProgress, XpEvent, XpSource,
};
use super::srs;
use super::storage::{ProgressStore, Result};
use super::streak::{calculate_streak, check_milestone, should_consume_freeze};

/// Orchestrates progress recording for all learners
pub struct ProgressTracker {
    store: ProgressStore,
    catalog: Box<dyn WordCatalog>,
    clock: Box<dyn Clock>,
    outbox: Option<SyncOutbox>,
    config: EngineConfig,
}

impl ProgressTracker {
    pub fn new(
        store: ProgressStore,
        catalog: Box<dyn WordCatalog>,
        clock: Box<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            outbox: None,
            config,
        }
    }

    /// Attach a sync outbox; commits are mirrored to it best-effort
    pub fn with_outbox(mut self, outbox: SyncOutbox) -> Self {
        self.outbox = Some(outbox);
        self
    }

    // ==================== Day bootstrap ====================

    /// Ensure today's activity row exists. Idempotent: the streak bootstrap
    /// sequence (freeze check, streak recompute, milestone, first-session
    /// bonus) runs only on the first call of the day.
    pub fn ensure_today(&self, user_id: &str) -> Result<()> {
        self.bootstrap_day(user_id)?;
        Ok(())
    }

    fn bootstrap_day(&self, user_id: &str) -> Result<(UserProfile, DailyActivity)> {
        let now = self.clock.now();
        let today = self.clock.today();
        let yesterday = self.clock.yesterday();

        let mut profile = match self.store.load_profile(user_id)? {
            Some(profile) => profile,
            None => {
                log::info!("Creating profile for new learner {}", user_id);
                UserProfile::new(
                    user_id,
                    now,
                    self.config.daily_goal_xp,
                    self.config.initial_streak_freezes,
                )
            }
        };

        if let Some(activity) = self.store.load_day(user_id, today)? {
            return Ok((profile, activity));
        }

        // First action of the day.
        let history = self.store.list_days(user_id)?;
        let active: Vec<NaiveDate> = history.iter().map(|d| d.date).collect();
        let mut frozen: Vec<NaiveDate> = history
            .iter()
            .filter(|d| d.streak_freeze_used)
            .map(|d| d.date)
            .collect();

        let mut bridged_day = None;
        if should_consume_freeze(&active, today, yesterday) && profile.streak_freezes > 0 {
            profile.streak_freezes -= 1;
            frozen.push(yesterday);
            bridged_day = Some(DailyActivity::frozen(user_id, yesterday, now));
            log::info!("Streak freeze consumed for {} bridging {}", user_id, yesterday);
        }

        let mut days = active;
        days.push(today);
        if bridged_day.is_some() {
            days.push(yesterday);
        }

        // Bridged days keep the run unbroken but do not count toward length
        let raw = calculate_streak(&days, today, yesterday);
        let run_start = today - Duration::days(i64::from(raw.saturating_sub(1)));
        let frozen_in_run = frozen
            .iter()
            .filter(|d| **d >= run_start && **d <= today)
            .count() as u32;
        let streak = raw.saturating_sub(frozen_in_run);

        profile.current_streak = streak;
        profile.best_streak = profile.best_streak.max(streak);

        let mut activity = DailyActivity::new(user_id, today, profile.daily_goal_xp, now);
        let mut events = Vec::new();

        if let Some(milestone) = check_milestone(streak) {
            log::info!("{} reached a {}-day streak", user_id, milestone.days);
            events.push(XpEvent::flat(
                user_id,
                today,
                XpSource::StreakMilestone { days: milestone.days },
                milestone.bonus_xp,
                now,
            ));
        }
        if profile.last_active_date != Some(today) {
            events.push(XpEvent::flat(
                user_id,
                today,
                XpSource::FirstSessionBonus,
                XP_FIRST_SESSION_BONUS,
                now,
            ));
        }
        profile.last_active_date = Some(today);

        for event in &events {
            activity.total_xp_earned += event.amount;
            profile.total_xp += event.amount;
        }
        self.settle_goal(&mut profile, &mut activity, &mut events, now);
        activity.last_updated_at = now;

        if let Some(frozen_row) = &bridged_day {
            self.store.save_day(frozen_row)?;
            self.mirror(MirrorOperation::UpdateDay {
                user_id: user_id.to_string(),
                date: frozen_row.date,
            });
        }
        self.store.save_day(&activity)?;
        self.store.save_profile(&profile)?;
        for event in &events {
            self.store.append_event(event)?;
        }

        self.mirror(MirrorOperation::UpdateDay {
            user_id: user_id.to_string(),
            date: today,
        });
        self.mirror(MirrorOperation::UpdateProfile {
            user_id: user_id.to_string(),
        });
        for event in &events {
            self.mirror(MirrorOperation::AppendXpEvent {
                user_id: user_id.to_string(),
                event_id: event.id,
            });
        }

        Ok((profile, activity))
    }

    // ==================== Recorded actions ====================

    /// Record a word card view. Small reward, no scheduling change.
    pub fn record_word_view(&self, user_id: &str, word_id: &str) -> Result<ActionSummary> {
        let now = self.clock.now();
        let (mut profile, mut activity) = self.bootstrap_day(user_id)?;
        let xp_before = profile.total_xp;

        let mut word = self.load_or_create_word(user_id, word_id)?;
        word.view_count += 1;
        activity.words_viewed += 1;

        let mut events = Vec::new();
        let (base, mult) = self.award(
            &mut profile,
            &mut activity,
            XpSource::WordView,
            XP_WORD_VIEW,
            Some(word_id),
            &mut events,
            now,
        );
        let goal_just_met = self.settle_goal(&mut profile, &mut activity, &mut events, now);

        self.commit(&word, &mut activity, &profile, &events, now)?;
        Ok(self.summarize(base, mult, &events, xp_before, &profile, goal_just_met))
    }

    /// Record a successful passive recall. Returns None (and records
    /// nothing) when the catalog has no metadata for the word.
    pub fn record_recall_success(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<ActionSummary>> {
        let Some(meta) = self.catalog.lookup(word_id) else {
            log::warn!("No catalog entry for {}; recall not recorded", word_id);
            return Ok(None);
        };

        let now = self.clock.now();
        let (mut profile, mut activity) = self.bootstrap_day(user_id)?;
        let xp_before = profile.total_xp;

        let word = self.load_or_create_word(user_id, word_id)?;
        let previous_state = word.known_state;
        let word = srs::on_recall_success(&word, &meta, &self.config.srs, now);
        activity.recall_success_count += 1;

        let mut events = Vec::new();
        let (base, mult) = self.award(
            &mut profile,
            &mut activity,
            XpSource::RecallSuccess,
            XP_RECALL_SUCCESS,
            Some(word_id),
            &mut events,
            now,
        );
        self.settle_mastery_transition(
            &mut profile,
            &mut activity,
            previous_state,
            &word,
            &mut events,
            now,
        );
        let goal_just_met = self.settle_goal(&mut profile, &mut activity, &mut events, now);

        self.commit(&word, &mut activity, &profile, &events, now)?;
        Ok(Some(self.summarize(base, mult, &events, xp_before, &profile, goal_just_met)))
    }

    /// Record a failed recall. No reward; the word is rescheduled for a
    /// short re-test.
    pub fn record_recall_fail(&self, user_id: &str, word_id: &str) -> Result<ActionSummary> {
        let now = self.clock.now();
        let (profile, mut activity) = self.bootstrap_day(user_id)?;

        let word = self.load_or_create_word(user_id, word_id)?;
        let word = srs::on_recall_fail(&word, now);
        activity.recall_fail_count += 1;

        self.commit(&word, &mut activity, &profile, &[], now)?;
        Ok(self.summarize(0, streak_multiplier(profile.current_streak), &[], profile.total_xp, &profile, false))
    }

    /// Record a successful active production ("practice"). Returns None when
    /// the catalog has no metadata for the word.
    pub fn record_production_success(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<ActionSummary>> {
        let Some(meta) = self.catalog.lookup(word_id) else {
            log::warn!("No catalog entry for {}; practice not recorded", word_id);
            return Ok(None);
        };

        let now = self.clock.now();
        let (mut profile, mut activity) = self.bootstrap_day(user_id)?;
        let xp_before = profile.total_xp;

        let word = self.load_or_create_word(user_id, word_id)?;
        let previous_state = word.known_state;
        let word = srs::on_production_success(&word, &meta, &self.config.srs, now);
        activity.practice_success_count += 1;

        let mut events = Vec::new();
        let (base, mult) = self.award(
            &mut profile,
            &mut activity,
            XpSource::PracticeSuccess,
            XP_PRACTICE_SUCCESS,
            Some(word_id),
            &mut events,
            now,
        );
        self.settle_mastery_transition(
            &mut profile,
            &mut activity,
            previous_state,
            &word,
            &mut events,
            now,
        );
        let goal_just_met = self.settle_goal(&mut profile, &mut activity, &mut events, now);

        self.commit(&word, &mut activity, &profile, &events, now)?;
        Ok(Some(self.summarize(base, mult, &events, xp_before, &profile, goal_just_met)))
    }

    /// Explicitly mark a word as mastered. The mastery reward is granted only
    /// on the actual transition, so re-marking is safe.
    pub fn record_word_mastered(&self, user_id: &str, word_id: &str) -> Result<ActionSummary> {
        let now = self.clock.now();
        let (mut profile, mut activity) = self.bootstrap_day(user_id)?;
        let xp_before = profile.total_xp;

        let word = self.load_or_create_word(user_id, word_id)?;
        let previous_state = word.known_state;
        let word = srs::promote_to_mastered(&word, now);

        let mut events = Vec::new();
        let mult = streak_multiplier(profile.current_streak);
        let mut base = 0;
        if previous_state != KnownState::Mastered {
            activity.mastered_count += 1;
            base = XP_WORD_MASTERED;
            self.award(
                &mut profile,
                &mut activity,
                XpSource::WordMastered,
                XP_WORD_MASTERED,
                Some(word_id),
                &mut events,
                now,
            );
        }
        let goal_just_met = self.settle_goal(&mut profile, &mut activity, &mut events, now);

        self.commit(&word, &mut activity, &profile, &events, now)?;
        Ok(self.summarize(base, mult, &events, xp_before, &profile, goal_just_met))
    }

    /// Record a completed study session (engagement only, no reward)
    pub fn record_session(&self, user_id: &str, duration_ms: u64) -> Result<()> {
        let now = self.clock.now();
        let (_, mut activity) = self.bootstrap_day(user_id)?;

        activity.session_count += 1;
        activity.total_time_ms += duration_ms;
        activity.last_updated_at = now;
        self.store.save_day(&activity)?;
        self.mirror(MirrorOperation::UpdateDay {
            user_id: user_id.to_string(),
            date: activity.date,
        });
        Ok(())
    }

    /// Record a card swipe (engagement signal, no reward)
    pub fn record_swipe(
        &self,
        user_id: &str,
        word_id: &str,
        direction: SwipeDirection,
    ) -> Result<()> {
        self.bootstrap_day(user_id)?;

        let mut word = self.load_or_create_word(user_id, word_id)?;
        match direction {
            SwipeDirection::Left => word.swipe_left_count += 1,
            SwipeDirection::Right => word.swipe_right_count += 1,
        }
        self.store.save_word(&word)?;
        self.mirror(MirrorOperation::UpdateWord {
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
        });
        Ok(())
    }

    /// Toggle a word's bookmark flag
    pub fn set_bookmarked(&self, user_id: &str, word_id: &str, bookmarked: bool) -> Result<()> {
        self.bootstrap_day(user_id)?;

        let mut word = self.load_or_create_word(user_id, word_id)?;
        word.bookmarked = bookmarked;
        self.store.save_word(&word)?;
        self.mirror(MirrorOperation::UpdateWord {
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
        });
        Ok(())
    }

    /// Change the profile's daily XP goal. Today's snapshot keeps the old
    /// target; the new one applies from the next bootstrap.
    pub fn set_daily_goal(&self, user_id: &str, daily_goal_xp: i64) -> Result<()> {
        let (mut profile, _) = self.bootstrap_day(user_id)?;
        profile.daily_goal_xp = daily_goal_xp;
        self.store.save_profile(&profile)?;
        self.mirror(MirrorOperation::UpdateProfile {
            user_id: user_id.to_string(),
        });
        Ok(())
    }

    // ==================== Dashboard ====================

    /// Read-only aggregation for the UI. Never mutates; missing entities are
    /// reported as zeroes.
    pub fn get_dashboard(&self, user_id: &str) -> Result<DashboardData> {
        let now = self.clock.now();
        let today = self.clock.today();

        let profile = self
            .store
            .load_profile(user_id)?
            .unwrap_or_else(|| {
                UserProfile::new(
                    user_id,
                    now,
                    self.config.daily_goal_xp,
                    self.config.initial_streak_freezes,
                )
            });

        let days = self.store.list_days(user_id)?;
        let today_row = days.iter().find(|d| d.date == today);
        let words = self.store.list_words(user_id)?;

        let level = UserLevel::from_xp(profile.total_xp);
        let count_state =
            |state: KnownState| words.iter().filter(|w| w.known_state == state).count();

        Ok(DashboardData {
            total_xp: profile.total_xp,
            today_xp: today_row.map_or(0, |d| d.total_xp_earned),
            level: level.level,
            level_progress: level.progress,
            xp_to_next_level: level.xp_to_next,
            current_streak: profile.current_streak,
            best_streak: profile.best_streak,
            streak_freezes: profile.streak_freezes,
            words_viewed: words.iter().filter(|w| w.view_count > 0).count(),
            words_learning: count_state(KnownState::Learning),
            words_learned: count_state(KnownState::Known),
            words_mastered: count_state(KnownState::Mastered),
            words_needing_review: words.iter().filter(|w| w.is_due(now)).count(),
            session_count: days.iter().map(|d| d.session_count).sum(),
            total_time_ms: days.iter().map(|d| d.total_time_ms).sum(),
            days_active: days.iter().filter(|d| !d.streak_freeze_used).count(),
            daily_goal_target: today_row.map_or(profile.daily_goal_xp, |d| d.daily_goal_target),
            daily_goal_progress: today_row.map_or(0, |d| d.total_xp_earned),
            daily_goal_met: today_row.map_or(false, |d| d.daily_goal_met),
        })
    }

    // ==================== Internals ====================

    fn load_or_create_word(&self, user_id: &str, word_id: &str) -> Result<WordProgress> {
        Ok(self
            .store
            .load_word(user_id, word_id)?
            .unwrap_or_else(|| WordProgress::new(user_id, word_id)))
    }

    /// Create a multiplied reward event and apply it to both running totals.
    /// Returns (base_xp, multiplier) for the action summary.
    fn award(
        &self,
        profile: &mut UserProfile,
        activity: &mut DailyActivity,
        source: XpSource,
        base_xp: i64,
        word_id: Option<&str>,
        events: &mut Vec<XpEvent>,
        now: DateTime<Utc>,
    ) -> (i64, f32) {
        let multiplier = streak_multiplier(profile.current_streak);
        let amount = apply_multiplier(base_xp, profile.current_streak);
        events.push(XpEvent::rewarded(
            &profile.user_id,
            activity.date,
            source,
            base_xp,
            multiplier,
            amount,
            word_id,
            now,
        ));
        activity.total_xp_earned += amount;
        profile.total_xp += amount;
        (base_xp, multiplier)
    }

    /// Grant the mastery reward when this action moved the word to MASTERED
    fn settle_mastery_transition(
        &self,
        profile: &mut UserProfile,
        activity: &mut DailyActivity,
        previous_state: KnownState,
        word: &WordProgress,
        events: &mut Vec<XpEvent>,
        now: DateTime<Utc>,
    ) {
        if previous_state != KnownState::Mastered && word.known_state == KnownState::Mastered {
            activity.mastered_count += 1;
            self.award(
                profile,
                activity,
                XpSource::WordMastered,
                XP_WORD_MASTERED,
                Some(&word.word_id),
                events,
                now,
            );
        }
    }

    /// Flip `daily_goal_met` and grant the flat bonus on the first crossing
    /// of today's target. The flag is only ever set, never cleared.
    fn settle_goal(
        &self,
        profile: &mut UserProfile,
        activity: &mut DailyActivity,
        events: &mut Vec<XpEvent>,
        now: DateTime<Utc>,
    ) -> bool {
        if activity.daily_goal_met || activity.daily_goal_target <= 0 {
            return false;
        }
        if activity.total_xp_earned < activity.daily_goal_target {
            return false;
        }

        activity.daily_goal_met = true;
        let bonus = XpEvent::flat(
            &profile.user_id,
            activity.date,
            XpSource::DailyGoalBonus,
            XP_DAILY_GOAL_BONUS,
            now,
        );
        activity.total_xp_earned += bonus.amount;
        profile.total_xp += bonus.amount;
        events.push(bonus);
        log::info!("{} met the daily goal of {} XP", profile.user_id, activity.daily_goal_target);
        true
    }

    /// Persist one action's writes in the fixed order, then mirror them
    fn commit(
        &self,
        word: &WordProgress,
        activity: &mut DailyActivity,
        profile: &UserProfile,
        events: &[XpEvent],
        now: DateTime<Utc>,
    ) -> Result<()> {
        activity.last_updated_at = now;

        self.store.save_word(word)?;
        self.store.save_day(activity)?;
        self.store.save_profile(profile)?;
        for event in events {
            self.store.append_event(event)?;
        }

        self.mirror(MirrorOperation::UpdateWord {
            user_id: word.user_id.clone(),
            word_id: word.word_id.clone(),
        });
        self.mirror(MirrorOperation::UpdateDay {
            user_id: activity.user_id.clone(),
            date: activity.date,
        });
        self.mirror(MirrorOperation::UpdateProfile {
            user_id: profile.user_id.clone(),
        });
        for event in events {
            self.mirror(MirrorOperation::AppendXpEvent {
                user_id: event.user_id.clone(),
                event_id: event.id,
            });
        }
        Ok(())
    }

    fn summarize(
        &self,
        base_xp: i64,
        multiplier: f32,
        events: &[XpEvent],
        xp_before: i64,
        profile: &UserProfile,
        goal_just_met: bool,
    ) -> ActionSummary {
        let level_before = UserLevel::from_xp(xp_before).level;
        let level_now = UserLevel::from_xp(profile.total_xp);
        ActionSummary {
            base_xp,
            streak_multiplier: multiplier,
            total_xp_awarded: events.iter().map(|e| e.amount).sum(),
            new_lifetime_xp: profile.total_xp,
            new_level: level_now.level,
            leveled_up: level_now.level > level_before,
            daily_goal_just_met: goal_just_met,
        }
    }

    fn mirror(&self, operation: MirrorOperation) {
        if let Some(outbox) = &self.outbox {
            outbox.emit(operation, self.clock.now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StaticCatalog, WordMeta};
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const USER: &str = "learner-1";

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn tracker_at(now: DateTime<Utc>, dir: &TempDir) -> ProgressTracker {
        let catalog = StaticCatalog::with_fallback(WordMeta { rank: 100, frequency: 500 });
        ProgressTracker::new(
            ProgressStore::new(dir.path().to_path_buf()),
            Box::new(catalog),
            Box::new(FixedClock(now)),
            EngineConfig::default(),
        )
    }

    fn store_for(dir: &TempDir) -> ProgressStore {
        ProgressStore::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_ensure_today_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        for _ in 0..5 {
            tracker.ensure_today(USER).unwrap();
        }

        let store = store_for(&dir);
        let days = store.list_days(USER).unwrap();
        assert_eq!(days.len(), 1);

        // exactly one first-session bonus despite five calls
        let events = store.read_events(USER, now.date_naive()).unwrap();
        let bonuses = events
            .iter()
            .filter(|e| e.source == XpSource::FirstSessionBonus)
            .count();
        assert_eq!(bonuses, 1);

        let profile = store.load_profile(USER).unwrap().unwrap();
        assert_eq!(profile.last_active_date, Some(now.date_naive()));
        assert_eq!(profile.current_streak, 1);
    }

    #[test]
    fn test_catalog_miss_records_nothing() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = ProgressTracker::new(
            store_for(&dir),
            Box::new(StaticCatalog::new()), // knows no words
            Box::new(FixedClock(now)),
            EngineConfig::default(),
        );

        let summary = tracker.record_recall_success(USER, "unknown").unwrap();
        assert!(summary.is_none());

        // true no-op: not even the day was bootstrapped
        let store = store_for(&dir);
        assert!(store.list_days(USER).unwrap().is_empty());
        assert!(store.load_word(USER, "unknown").unwrap().is_none());
    }

    #[test]
    fn test_recall_success_updates_word_day_and_ledger() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        let summary = tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        assert_eq!(summary.base_xp, XP_RECALL_SUCCESS);
        // brand-new learner: streak 1 after bootstrap
        assert!((summary.streak_multiplier - 1.05).abs() < 1e-6);

        let store = store_for(&dir);
        let word = store.load_word(USER, "haus").unwrap().unwrap();
        assert_eq!(word.recall_success_count, 1);
        assert!(word.next_review.is_some());

        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert_eq!(day.recall_success_count, 1);

        // ledger reconciles with the day's running total
        let events = store.read_events(USER, now.date_naive()).unwrap();
        let sum: i64 = events.iter().map(|e| e.amount).sum();
        assert_eq!(sum, day.total_xp_earned);
    }

    #[test]
    fn test_ledger_reconciles_over_many_actions() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        tracker.record_word_view(USER, "haus").unwrap();
        tracker.record_recall_success(USER, "haus").unwrap();
        tracker.record_recall_fail(USER, "baum").unwrap();
        tracker.record_production_success(USER, "haus").unwrap();
        tracker.record_word_view(USER, "baum").unwrap();
        tracker.record_word_mastered(USER, "tür").unwrap();

        let store = store_for(&dir);
        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        let events = store.read_events(USER, now.date_naive()).unwrap();
        let sum: i64 = events.iter().map(|e| e.amount).sum();
        assert_eq!(sum, day.total_xp_earned);

        // the profile was created today, so lifetime XP matches too
        let profile = store.load_profile(USER).unwrap().unwrap();
        assert_eq!(profile.total_xp, sum);
    }

    #[test]
    fn test_daily_goal_bonus_fires_exactly_once() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let mut config = EngineConfig::default();
        config.daily_goal_xp = 20;
        let tracker = ProgressTracker::new(
            store_for(&dir),
            Box::new(StaticCatalog::with_fallback(WordMeta { rank: 100, frequency: 500 })),
            Box::new(FixedClock(now)),
            config,
        );

        // bootstrap bonus 5, then 10 XP recalls at multiplier 1.05 = 10 each
        let first = tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        assert!(!first.daily_goal_just_met);

        let second = tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        assert!(second.daily_goal_just_met);

        let third = tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        assert!(!third.daily_goal_just_met);

        let store = store_for(&dir);
        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert!(day.daily_goal_met);

        let events = store.read_events(USER, now.date_naive()).unwrap();
        let bonuses = events
            .iter()
            .filter(|e| e.source == XpSource::DailyGoalBonus)
            .count();
        assert_eq!(bonuses, 1);
    }

    #[test]
    fn test_streak_six_recall_awards_thirteen_and_levels_up() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let store = store_for(&dir);

        // learner already bootstrapped today with a 6-day streak, 10 XP shy
        // of the level-3 threshold (250)
        let mut profile = UserProfile::new(USER, now, 50, 2);
        profile.total_xp = 240;
        profile.current_streak = 6;
        profile.best_streak = 6;
        profile.last_active_date = Some(now.date_naive());
        store.save_profile(&profile).unwrap();
        store
            .save_day(&DailyActivity::new(USER, now.date_naive(), 50, now))
            .unwrap();

        let tracker = tracker_at(now, &dir);
        let summary = tracker.record_recall_success(USER, "haus").unwrap().unwrap();

        assert_eq!(summary.base_xp, 10);
        assert!((summary.streak_multiplier - 1.3).abs() < 1e-6);
        assert_eq!(summary.total_xp_awarded, 13);
        assert_eq!(summary.new_lifetime_xp, 253);
        assert_eq!(summary.new_level, 3);
        assert!(summary.leveled_up);
    }

    #[test]
    fn test_freeze_bridges_single_gap() {
        let dir = TempDir::new().unwrap();
        let today = noon(2026, 1, 20);
        let store = store_for(&dir);

        // three-day run ending two days ago, one freeze available
        let mut profile = UserProfile::new(USER, today, 50, 1);
        profile.current_streak = 3;
        profile.best_streak = 3;
        profile.last_active_date = Some(NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());
        store.save_profile(&profile).unwrap();
        for d in 16..=18 {
            let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
            store.save_day(&DailyActivity::new(USER, date, 50, today)).unwrap();
        }

        let tracker = tracker_at(today, &dir);
        tracker.ensure_today(USER).unwrap();

        let profile = store.load_profile(USER).unwrap().unwrap();
        // bridged day preserves continuity but doesn't count: 3 + today
        assert_eq!(profile.current_streak, 4);
        assert_eq!(profile.streak_freezes, 0);

        let bridged = store
            .load_day(USER, NaiveDate::from_ymd_opt(2026, 1, 19).unwrap())
            .unwrap()
            .unwrap();
        assert!(bridged.streak_freeze_used);

        // next day continues the streak through the bridge
        let tomorrow = noon(2026, 1, 21);
        let tracker = tracker_at(tomorrow, &dir);
        tracker.ensure_today(USER).unwrap();
        let profile = store.load_profile(USER).unwrap().unwrap();
        assert_eq!(profile.current_streak, 5);
    }

    #[test]
    fn test_gap_without_freeze_resets_streak() {
        let dir = TempDir::new().unwrap();
        let today = noon(2026, 1, 20);
        let store = store_for(&dir);

        let mut profile = UserProfile::new(USER, today, 50, 0); // no freezes
        profile.current_streak = 3;
        profile.best_streak = 3;
        store.save_profile(&profile).unwrap();
        for d in 16..=18 {
            let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
            store.save_day(&DailyActivity::new(USER, date, 50, today)).unwrap();
        }

        let tracker = tracker_at(today, &dir);
        tracker.ensure_today(USER).unwrap();

        let profile = store.load_profile(USER).unwrap().unwrap();
        assert_eq!(profile.current_streak, 1);
        // best streak is never lowered
        assert_eq!(profile.best_streak, 3);
    }

    #[test]
    fn test_streak_milestone_fires_once() {
        let dir = TempDir::new().unwrap();
        let today = noon(2026, 1, 20);
        let store = store_for(&dir);

        // six-day run ending yesterday: today's bootstrap reaches 7
        let mut profile = UserProfile::new(USER, today, 50, 0);
        profile.current_streak = 6;
        profile.best_streak = 6;
        profile.last_active_date = Some(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
        store.save_profile(&profile).unwrap();
        for d in 14..=19 {
            let date = NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
            store.save_day(&DailyActivity::new(USER, date, 50, today)).unwrap();
        }

        let tracker = tracker_at(today, &dir);
        tracker.ensure_today(USER).unwrap();
        tracker.ensure_today(USER).unwrap();

        let profile = store.load_profile(USER).unwrap().unwrap();
        assert_eq!(profile.current_streak, 7);

        let events = store.read_events(USER, today.date_naive()).unwrap();
        let milestones: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.source, XpSource::StreakMilestone { .. }))
            .collect();
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].amount, 70);
        assert_eq!(milestones[0].multiplier, 1.0);
    }

    #[test]
    fn test_mastery_transition_rewards_once() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        // default thresholds: the 9th success promotes to MASTERED
        for _ in 0..9 {
            tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        }

        let store = store_for(&dir);
        let word = store.load_word(USER, "haus").unwrap().unwrap();
        assert_eq!(word.known_state, KnownState::Mastered);

        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert_eq!(day.mastered_count, 1);

        let events = store.read_events(USER, now.date_naive()).unwrap();
        let mastered = events
            .iter()
            .filter(|e| e.source == XpSource::WordMastered)
            .count();
        assert_eq!(mastered, 1);

        // further successes don't re-award mastery
        tracker.record_recall_success(USER, "haus").unwrap().unwrap();
        let events = store.read_events(USER, now.date_naive()).unwrap();
        let mastered = events
            .iter()
            .filter(|e| e.source == XpSource::WordMastered)
            .count();
        assert_eq!(mastered, 1);
    }

    #[test]
    fn test_explicit_mastering_is_transition_guarded() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        let first = tracker.record_word_mastered(USER, "haus").unwrap();
        assert_eq!(first.base_xp, XP_WORD_MASTERED);
        assert!(first.total_xp_awarded > 0);

        let again = tracker.record_word_mastered(USER, "haus").unwrap();
        assert_eq!(again.base_xp, 0);
        assert_eq!(again.total_xp_awarded, 0);

        let store = store_for(&dir);
        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert_eq!(day.mastered_count, 1);
    }

    #[test]
    fn test_recall_fail_awards_nothing() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        let summary = tracker.record_recall_fail(USER, "haus").unwrap();
        assert_eq!(summary.base_xp, 0);
        assert_eq!(summary.total_xp_awarded, 0);
        assert!(!summary.leveled_up);

        let store = store_for(&dir);
        let word = store.load_word(USER, "haus").unwrap().unwrap();
        assert_eq!(word.lapses_count, 1);
        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert_eq!(day.recall_fail_count, 1);
    }

    #[test]
    fn test_session_and_swipe_counters() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        tracker.record_session(USER, 120_000).unwrap();
        tracker.record_session(USER, 60_000).unwrap();
        tracker.record_swipe(USER, "haus", SwipeDirection::Right).unwrap();
        tracker.record_swipe(USER, "haus", SwipeDirection::Left).unwrap();
        tracker.set_bookmarked(USER, "haus", true).unwrap();

        let store = store_for(&dir);
        let day = store.load_day(USER, now.date_naive()).unwrap().unwrap();
        assert_eq!(day.session_count, 2);
        assert_eq!(day.total_time_ms, 180_000);

        let word = store.load_word(USER, "haus").unwrap().unwrap();
        assert_eq!(word.swipe_right_count, 1);
        assert_eq!(word.swipe_left_count, 1);
        assert!(word.bookmarked);
    }

    #[test]
    fn test_dashboard_aggregates() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let tracker = tracker_at(now, &dir);

        tracker.record_word_view(USER, "haus").unwrap();
        tracker.record_recall_success(USER, "haus").unwrap();
        tracker.record_word_mastered(USER, "baum").unwrap();
        tracker.record_session(USER, 30_000).unwrap();

        let dashboard = tracker.get_dashboard(USER).unwrap();
        assert_eq!(dashboard.current_streak, 1);
        assert_eq!(dashboard.words_mastered, 1);
        assert_eq!(dashboard.days_active, 1);
        assert_eq!(dashboard.session_count, 1);
        assert_eq!(dashboard.total_time_ms, 30_000);
        assert!(dashboard.today_xp > 0);
        assert_eq!(dashboard.total_xp, dashboard.today_xp);
        assert_eq!(dashboard.level, 1);
        assert!(dashboard.level_progress >= 0.0 && dashboard.level_progress < 1.0);
    }

    #[test]
    fn test_dashboard_for_unknown_user_is_zeroed() {
        let dir = TempDir::new().unwrap();
        let tracker = tracker_at(noon(2026, 1, 10), &dir);

        let dashboard = tracker.get_dashboard("nobody").unwrap();
        assert_eq!(dashboard.total_xp, 0);
        assert_eq!(dashboard.current_streak, 0);
        assert_eq!(dashboard.days_active, 0);

        // reads never create rows
        let store = store_for(&dir);
        assert!(store.load_profile("nobody").unwrap().is_none());
    }

    #[test]
    fn test_outbox_mirrors_commits() {
        let dir = TempDir::new().unwrap();
        let now = noon(2026, 1, 10);
        let outbox_path = dir.path().join("sync_queue.jsonl");
        let catalog = StaticCatalog::with_fallback(WordMeta { rank: 100, frequency: 500 });
        let tracker = ProgressTracker::new(
            store_for(&dir),
            Box::new(catalog),
            Box::new(FixedClock(now)),
            EngineConfig::default(),
        )
        .with_outbox(SyncOutbox::new(outbox_path.clone()));

        tracker.record_recall_success(USER, "haus").unwrap().unwrap();

        let records = SyncOutbox::new(outbox_path).read_all();
        assert!(records
            .iter()
            .any(|r| matches!(&r.operation, MirrorOperation::UpdateWord { word_id, .. } if word_id == "haus")));
        assert!(records
            .iter()
            .any(|r| matches!(&r.operation, MirrorOperation::UpdateProfile { .. })));
    }
}
