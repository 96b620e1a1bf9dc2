//! XP, levels, streaks, achievements and weekly challenges.

pub mod achievements;
pub mod challenges;
pub mod level;
pub mod stats;
pub mod xp;

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::lifecycle::GamificationSink;
use crate::model::task::{Priority, Task};

pub use achievements::{Achievement, check_achievements};
pub use challenges::{Challenge, ChallengeKind, Difficulty, WeeklyChallenges};
pub use level::{LevelInfo, level_for, level_info};
pub use stats::{DayStats, Stats};
pub use xp::{XpTable, xp_for_priority};

/// Notable outcome of a gamification update, queued for the caller to
/// report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Reward {
    Xp { amount: u64 },
    AchievementUnlocked { id: &'static str, name: &'static str, xp: u64 },
    ChallengeCompleted { id: String, title: String, xp: u64 },
    LevelUp { level: u32, title: &'static str },
}

/// Gamification aggregate. Receives completion events from the task engine
/// and focus time from the caller.
#[derive(Debug, Clone, Default)]
pub struct Gamification {
    stats: Stats,
    xp_table: XpTable,
    challenges_enabled: bool,
    rewards: Vec<Reward>,
}

impl Gamification {
    #[must_use]
    pub fn new(stats: Stats, xp_table: XpTable, challenges_enabled: bool) -> Self {
        Self {
            stats,
            xp_table,
            challenges_enabled,
            rewards: Vec::new(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Replace the whole state, e.g. after an import.
    pub fn replace_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    /// Zero everything, achievements and challenges included.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.rewards.clear();
    }

    /// Drop per-day history older than `keep_days`.
    pub fn prune_history(&mut self, today: NaiveDate, keep_days: u32) -> usize {
        self.stats.prune_history(today, keep_days)
    }

    /// Rewards queued since the last drain, oldest first.
    pub fn drain_rewards(&mut self) -> Vec<Reward> {
        std::mem::take(&mut self.rewards)
    }

    #[must_use]
    pub fn level_info(&self) -> LevelInfo {
        level_info(self.stats.total_xp)
    }

    /// Log focus time and feed the focus challenges.
    pub fn add_focus_time(&mut self, seconds: u64, today: NaiveDate) {
        self.stats.add_focus_time(seconds, today);
        self.update_challenge_progress(ChallengeKind::FocusTime, seconds, today);
        self.check_achievements(today);
    }

    /// Draw this week's challenges if the stored set is stale.
    pub fn generate_weekly_challenges<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> bool {
        if !self.challenges_enabled {
            return false;
        }
        self.stats.challenges.generate(today, rng)
    }

    pub fn update_challenge_progress(&mut self, kind: ChallengeKind, amount: u64, today: NaiveDate) {
        if !self.challenges_enabled {
            return;
        }
        let crossed = self.stats.challenges.update_progress(kind, amount, today);
        self.reward_challenges(crossed);
    }

    pub fn set_challenge_progress(&mut self, kind: ChallengeKind, value: u64, today: NaiveDate) {
        if !self.challenges_enabled {
            return;
        }
        let crossed = self.stats.challenges.set_progress(kind, value, today);
        self.reward_challenges(crossed);
    }

    /// This week's challenges, or nothing when the stored set is stale.
    #[must_use]
    pub fn current_challenges(&self, today: NaiveDate) -> &[Challenge] {
        if self.stats.challenges.is_current(today) {
            &self.stats.challenges.active
        } else {
            &[]
        }
    }

    /// Unlock newly satisfied achievements. Returns how many were unlocked.
    pub fn check_achievements(&mut self, today: NaiveDate) -> usize {
        let level_before = level_for(self.stats.total_xp);
        let unlocked = check_achievements(&mut self.stats, today);
        for achievement in &unlocked {
            self.rewards.push(Reward::AchievementUnlocked {
                id: achievement.id,
                name: achievement.name,
                xp: achievement.xp,
            });
        }
        self.note_level_change(level_before);
        unlocked.len()
    }

    fn reward_challenges(&mut self, crossed: Vec<Challenge>) {
        let level_before = level_for(self.stats.total_xp);
        for challenge in crossed {
            self.stats.award_bonus_xp(challenge.xp);
            self.rewards.push(Reward::ChallengeCompleted {
                id: challenge.id,
                title: challenge.title,
                xp: challenge.xp,
            });
        }
        self.note_level_change(level_before);
    }

    fn note_level_change(&mut self, level_before: u32) {
        let info = self.level_info();
        if info.level > level_before {
            info!(level = info.level, title = info.title, "level up");
            self.rewards.push(Reward::LevelUp {
                level: info.level,
                title: info.title,
            });
        }
    }
}

impl GamificationSink for Gamification {
    fn task_completed(&mut self, task: &Task, today: NaiveDate) {
        let amount = xp_for_priority(Some(task.priority), &self.xp_table);
        let level_before = level_for(self.stats.total_xp);
        self.stats.add_xp(amount, today);
        self.rewards.push(Reward::Xp { amount });
        self.note_level_change(level_before);

        self.update_challenge_progress(ChallengeKind::TasksCompleted, 1, today);
        if task.priority == Priority::High {
            self.update_challenge_progress(ChallengeKind::HighPriority, 1, today);
        }
        if task.is_mit_on(today) {
            self.update_challenge_progress(ChallengeKind::MitsCompleted, 1, today);
        }
        let streak = u64::from(self.stats.current_streak);
        self.set_challenge_progress(ChallengeKind::Streak, streak, today);

        self.check_achievements(today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn high_task() -> Task {
        Task {
            id: "t-1".into(),
            title: "x".into(),
            priority: Priority::High,
            ..Task::default()
        }
    }

    fn gamification() -> Gamification {
        Gamification::new(Stats::default(), XpTable::default(), true)
    }

    #[test]
    fn completion_awards_priority_xp_and_first_achievement() {
        let mut g = gamification();
        let today = date(2024, 2, 1);
        g.task_completed(&high_task(), today);

        // 50 for the task, 10 for "first_task".
        assert_eq!(g.stats().total_xp, 60);
        assert_eq!(g.stats().total_tasks_completed, 1);
        let rewards = g.drain_rewards();
        assert_eq!(rewards[0], Reward::Xp { amount: 50 });
        assert!(rewards
            .iter()
            .any(|r| matches!(r, Reward::AchievementUnlocked { id: "first_task", .. })));
        assert!(g.drain_rewards().is_empty());
    }

    #[test]
    fn completion_feeds_matching_challenges() {
        let mut g = gamification();
        let today = date(2024, 2, 1);
        g.stats.challenges = WeeklyChallenges {
            week_start: Some(crate::clock::week_start(today)),
            active: vec![
                Challenge {
                    target: 1,
                    ..Challenge::from(&challenges::CATALOG[1])
                },
                Challenge::from(&challenges::CATALOG[0]),
            ],
            completed_total: 0,
        };

        g.task_completed(&high_task(), today);
        let active = g.current_challenges(today);
        assert!(active[0].completed);
        assert_eq!(active[1].progress, 1);
        assert_eq!(g.stats().challenges.completed_total, 1);
        // 50 task + 50 challenge + 10 first_task + 25 challenger.
        assert_eq!(g.stats().total_xp, 135);
    }

    #[test]
    fn mit_completion_counts_only_for_today() {
        let mut g = gamification();
        let today = date(2024, 2, 1);
        g.stats.challenges = WeeklyChallenges {
            week_start: Some(crate::clock::week_start(today)),
            active: vec![Challenge::from(
                challenges::CATALOG.iter().find(|t| t.id == "mits_10").unwrap(),
            )],
            completed_total: 0,
        };
        let mut task = high_task();
        task.is_mit = true;
        task.mit_date = Some(date(2024, 1, 31));
        g.task_completed(&task, today);
        assert_eq!(g.current_challenges(today)[0].progress, 0);

        task.mit_date = Some(today);
        g.task_completed(&task, today);
        assert_eq!(g.current_challenges(today)[0].progress, 1);
    }

    #[test]
    fn disabled_challenges_are_never_generated() {
        let mut g = Gamification::new(Stats::default(), XpTable::default(), false);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!g.generate_weekly_challenges(date(2024, 2, 1), &mut rng));
        assert!(g.current_challenges(date(2024, 2, 1)).is_empty());
    }

    #[test]
    fn level_up_is_reported() {
        let mut g = gamification();
        let today = date(2024, 2, 1);
        g.stats.total_xp = 95;
        g.task_completed(&high_task(), today);
        assert!(g
            .drain_rewards()
            .iter()
            .any(|r| matches!(r, Reward::LevelUp { level: 2, .. })));
    }

    #[test]
    fn focus_time_feeds_focus_challenge() {
        let mut g = gamification();
        let today = date(2024, 2, 1);
        g.stats.challenges = WeeklyChallenges {
            week_start: Some(crate::clock::week_start(today)),
            active: vec![Challenge::from(&challenges::CATALOG[2])],
            completed_total: 0,
        };
        g.add_focus_time(3600, today);
        g.add_focus_time(3600, today);
        assert!(g.current_challenges(today)[0].completed);
        assert_eq!(g.stats().focus_time_today(today), 7200);
    }
}
