use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::challenges::WeeklyChallenges;
use crate::clock::yesterday_of;

/// Per-day activity record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayStats {
    pub completed: u32,
    /// Seconds.
    pub focus_time: u64,
}

/// Persisted gamification state.
///
/// `tasks_completed_today` and `focus_time_today` belong to the day stored
/// alongside them (`last_completed_date` and `focus_date`). Read them
/// through [`Stats::tasks_completed_today`] and [`Stats::focus_time_today`],
/// which report 0 once that day has passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    #[serde(rename = "tasksCompletedToday")]
    pub completed_today_raw: u32,
    pub total_tasks_completed: u64,
    /// Seconds.
    #[serde(rename = "focusTimeToday")]
    pub focus_today_raw: u64,
    pub focus_date: Option<NaiveDate>,
    pub weekly_data: BTreeMap<NaiveDate, DayStats>,
    pub achievements: BTreeSet<String>,
    pub challenges: WeeklyChallenges,
}

impl Stats {
    /// Record one task completion worth `amount` XP on `today`.
    ///
    /// Streak: unchanged when the last completion was today, +1 when it was
    /// yesterday, otherwise restarts at 1.
    pub fn add_xp(&mut self, amount: u64, today: NaiveDate) {
        self.total_xp = self.total_xp.saturating_add(amount);

        let last = self.last_completed_date;
        if last == Some(today) {
            self.current_streak = self.current_streak.max(1);
            self.completed_today_raw = self.completed_today_raw.saturating_add(1);
        } else {
            self.current_streak = if last.is_some() && last == yesterday_of(today) {
                self.current_streak.saturating_add(1)
            } else {
                1
            };
            self.completed_today_raw = 1;
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_completed_date = Some(today);
        self.total_tasks_completed = self.total_tasks_completed.saturating_add(1);
        self.weekly_data.entry(today).or_default().completed += 1;

        debug!(
            xp = amount,
            total_xp = self.total_xp,
            streak = self.current_streak,
            "completion recorded"
        );
    }

    /// Add XP that is not tied to a task completion (achievement and
    /// challenge rewards).
    pub fn award_bonus_xp(&mut self, amount: u64) {
        self.total_xp = self.total_xp.saturating_add(amount);
    }

    pub fn add_focus_time(&mut self, seconds: u64, today: NaiveDate) {
        if self.focus_date == Some(today) {
            self.focus_today_raw = self.focus_today_raw.saturating_add(seconds);
        } else {
            self.focus_today_raw = seconds;
            self.focus_date = Some(today);
        }
        let day = self.weekly_data.entry(today).or_default();
        day.focus_time = day.focus_time.saturating_add(seconds);
    }

    #[must_use]
    pub fn tasks_completed_today(&self, today: NaiveDate) -> u32 {
        if self.last_completed_date == Some(today) {
            self.completed_today_raw
        } else {
            0
        }
    }

    #[must_use]
    pub fn focus_time_today(&self, today: NaiveDate) -> u64 {
        if self.focus_date == Some(today) {
            self.focus_today_raw
        } else {
            0
        }
    }

    /// Streak as seen on `today`: a streak whose last completion is older
    /// than yesterday is already broken.
    #[must_use]
    pub fn effective_streak(&self, today: NaiveDate) -> u32 {
        let alive = self.last_completed_date == Some(today)
            || (self.last_completed_date.is_some() && self.last_completed_date == yesterday_of(today));
        if alive { self.current_streak } else { 0 }
    }

    /// The seven days ending on `today`, oldest first, zero-filled.
    #[must_use]
    pub fn week_summary(&self, today: NaiveDate) -> Vec<(NaiveDate, DayStats)> {
        (0..7u64)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|day| (day, self.weekly_data.get(&day).copied().unwrap_or_default()))
            .collect()
    }

    /// Drop per-day records older than `keep_days` before `today`. Returns
    /// how many were dropped.
    pub fn prune_history(&mut self, today: NaiveDate, keep_days: u32) -> usize {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(keep_days))) else {
            return 0;
        };
        let before = self.weekly_data.len();
        self.weekly_data.retain(|day, _| *day >= cutoff);
        before - self.weekly_data.len()
    }

    /// Back to a zeroed state, achievements and challenges included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
