//! Fixed achievement catalog and the unlock pass.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::stats::Stats;

/// Statistic an achievement threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalCompleted,
    Streak,
    CompletedToday,
    /// Seconds of focus logged today.
    FocusToday,
    ChallengesCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u64,
    pub xp: u64,
}

impl Achievement {
    const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        metric: Metric,
        threshold: u64,
        xp: u64,
    ) -> Self {
        Self {
            id,
            name,
            description,
            metric,
            threshold,
            xp,
        }
    }

    /// Whether `stats` satisfies this achievement on `today`.
    #[must_use]
    pub fn is_satisfied(&self, stats: &Stats, today: NaiveDate) -> bool {
        metric_value(self.metric, stats, today) >= self.threshold
    }
}

pub const CATALOG: &[Achievement] = &[
    Achievement::new("first_task", "First Step", "Complete your first task", Metric::TotalCompleted, 1, 10),
    Achievement::new("ten_tasks", "Getting Things Done", "Complete 10 tasks", Metric::TotalCompleted, 10, 25),
    Achievement::new("fifty_tasks", "Momentum", "Complete 50 tasks", Metric::TotalCompleted, 50, 50),
    Achievement::new("century", "Centurion", "Complete 100 tasks", Metric::TotalCompleted, 100, 100),
    Achievement::new("five_hundred", "Unstoppable", "Complete 500 tasks", Metric::TotalCompleted, 500, 250),
    Achievement::new("streak_3", "On a Roll", "Keep a 3-day streak", Metric::Streak, 3, 25),
    Achievement::new("streak_7", "Week Warrior", "Keep a 7-day streak", Metric::Streak, 7, 50),
    Achievement::new("streak_30", "Habit Formed", "Keep a 30-day streak", Metric::Streak, 30, 200),
    Achievement::new("productive_day", "Productive Day", "Complete 5 tasks in one day", Metric::CompletedToday, 5, 30),
    Achievement::new("power_day", "Power Day", "Complete 10 tasks in one day", Metric::CompletedToday, 10, 75),
    Achievement::new("focus_hour", "Focused", "Log an hour of focus in one day", Metric::FocusToday, 3600, 30),
    Achievement::new("deep_work", "Deep Work", "Log four hours of focus in one day", Metric::FocusToday, 14_400, 100),
    Achievement::new("challenger", "Challenger", "Finish a weekly challenge", Metric::ChallengesCompleted, 1, 25),
    Achievement::new("challenge_master", "Challenge Master", "Finish 10 weekly challenges", Metric::ChallengesCompleted, 10, 150),
];

#[must_use]
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

fn metric_value(metric: Metric, stats: &Stats, today: NaiveDate) -> u64 {
    match metric {
        Metric::TotalCompleted => stats.total_tasks_completed,
        Metric::Streak => u64::from(stats.effective_streak(today)),
        Metric::CompletedToday => u64::from(stats.tasks_completed_today(today)),
        Metric::FocusToday => stats.focus_time_today(today),
        Metric::ChallengesCompleted => stats.challenges.completed_total,
    }
}

/// Unlock every catalog entry `stats` now satisfies and that is not held
/// yet, awarding each one's XP. Held achievements are never revisited, so a
/// repeat call with unchanged stats unlocks nothing.
pub fn check_achievements(stats: &mut Stats, today: NaiveDate) -> Vec<&'static Achievement> {
    let newly: Vec<&'static Achievement> = CATALOG
        .iter()
        .filter(|a| !stats.achievements.contains(a.id))
        .filter(|a| a.is_satisfied(stats, today))
        .collect();

    for achievement in &newly {
        stats.achievements.insert(achievement.id.to_string());
        stats.award_bonus_xp(achievement.xp);
        info!(achievement = achievement.id, xp = achievement.xp, "achievement unlocked");
    }
    newly
}
