//! Weekly challenges: three per Monday-start week, one per difficulty tier.

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::clock::week_start;

/// Event stream a challenge listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    TasksCompleted,
    HighPriority,
    MitsCompleted,
    /// Seconds of focus.
    FocusTime,
    /// Absolute streak length; fed with `set_progress`.
    Streak,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChallengeKind,
    pub difficulty: Difficulty,
    pub target: u64,
    pub xp: u64,
}

const fn template(
    id: &'static str,
    title: &'static str,
    kind: ChallengeKind,
    difficulty: Difficulty,
    target: u64,
    xp: u64,
) -> ChallengeTemplate {
    ChallengeTemplate {
        id,
        title,
        kind,
        difficulty,
        target,
        xp,
    }
}

pub const CATALOG: &[ChallengeTemplate] = &[
    template("complete_10", "Complete 10 tasks", ChallengeKind::TasksCompleted, Difficulty::Easy, 10, 50),
    template("high_3", "Finish 3 high-priority tasks", ChallengeKind::HighPriority, Difficulty::Easy, 3, 50),
    template("focus_2h", "Focus for 2 hours", ChallengeKind::FocusTime, Difficulty::Easy, 7200, 50),
    template("complete_25", "Complete 25 tasks", ChallengeKind::TasksCompleted, Difficulty::Medium, 25, 100),
    template("mits_10", "Finish 10 MITs", ChallengeKind::MitsCompleted, Difficulty::Medium, 10, 100),
    template("streak_5", "Reach a 5-day streak", ChallengeKind::Streak, Difficulty::Medium, 5, 100),
    template("focus_5h", "Focus for 5 hours", ChallengeKind::FocusTime, Difficulty::Medium, 18_000, 100),
    template("complete_50", "Complete 50 tasks", ChallengeKind::TasksCompleted, Difficulty::Hard, 50, 200),
    template("high_15", "Finish 15 high-priority tasks", ChallengeKind::HighPriority, Difficulty::Hard, 15, 200),
    template("streak_7", "Reach a 7-day streak", ChallengeKind::Streak, Difficulty::Hard, 7, 200),
    template("focus_10h", "Focus for 10 hours", ChallengeKind::FocusTime, Difficulty::Hard, 36_000, 200),
];

/// One active challenge instance for the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub difficulty: Difficulty,
    pub target: u64,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub completed: bool,
    pub xp: u64,
}

impl From<&ChallengeTemplate> for Challenge {
    fn from(t: &ChallengeTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            title: t.title.to_string(),
            kind: t.kind,
            difficulty: t.difficulty,
            target: t.target,
            progress: 0,
            completed: false,
            xp: t.xp,
        }
    }
}

impl Challenge {
    /// Apply a new progress value. Returns `true` only on the call that
    /// first reaches the target.
    fn advance_to(&mut self, value: u64) -> bool {
        if self.completed {
            return false;
        }
        self.progress = value.min(self.target);
        if value >= self.target {
            self.completed = true;
            return true;
        }
        false
    }
}

/// The week's challenge set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeeklyChallenges {
    pub week_start: Option<NaiveDate>,
    pub active: Vec<Challenge>,
    pub completed_total: u64,
}

impl WeeklyChallenges {
    /// Whether the stored set belongs to the week containing `today`.
    #[must_use]
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.week_start == Some(week_start(today))
    }

    /// Draw one challenge per tier for the week containing `today`, with
    /// progress reset. No-op when the set is already for this week.
    pub fn generate<R: Rng + ?Sized>(&mut self, today: NaiveDate, rng: &mut R) -> bool {
        if self.is_current(today) {
            return false;
        }
        self.active = Difficulty::ALL
            .iter()
            .filter_map(|tier| {
                let pool: Vec<&ChallengeTemplate> =
                    CATALOG.iter().filter(|t| t.difficulty == *tier).collect();
                pool.choose(&mut *rng).map(|t| Challenge::from(*t))
            })
            .collect();
        self.week_start = Some(week_start(today));
        debug!(
            week = ?self.week_start,
            challenges = ?self.active.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "weekly challenges generated"
        );
        true
    }

    /// Add `amount` to every open challenge of `kind`. Returns the
    /// challenges that crossed their target on this call.
    pub fn update_progress(&mut self, kind: ChallengeKind, amount: u64, today: NaiveDate) -> Vec<Challenge> {
        self.apply(kind, today, |c| c.progress.saturating_add(amount))
    }

    /// Overwrite the progress of every open challenge of `kind`. Returns
    /// the challenges that crossed their target on this call.
    pub fn set_progress(&mut self, kind: ChallengeKind, value: u64, today: NaiveDate) -> Vec<Challenge> {
        self.apply(kind, today, |_| value)
    }

    fn apply(
        &mut self,
        kind: ChallengeKind,
        today: NaiveDate,
        next: impl Fn(&Challenge) -> u64,
    ) -> Vec<Challenge> {
        if !self.is_current(today) {
            return Vec::new();
        }
        let mut crossed = Vec::new();
        for challenge in self.active.iter_mut().filter(|c| c.kind == kind) {
            let value = next(challenge);
            if challenge.advance_to(value) {
                info!(challenge = %challenge.id, xp = challenge.xp, "weekly challenge completed");
                crossed.push(challenge.clone());
            }
        }
        self.completed_total += u64::try_from(crossed.len()).unwrap_or(u64::MAX);
        crossed
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        })
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::TasksCompleted => "tasks_completed",
            Self::HighPriority => "high_priority",
            Self::MitsCompleted => "mits_completed",
            Self::FocusTime => "focus_time",
            Self::Streak => "streak",
            Self::Unknown => "unknown",
        })
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

    fn with_active(challenge: Challenge, today: NaiveDate) -> WeeklyChallenges {
        WeeklyChallenges {
            week_start: Some(week_start(today)),
            active: vec![challenge],
            completed_total: 0,
        }
    }

    fn counter(target: u64) -> Challenge {
        Challenge {
            target,
            ..Challenge::from(&CATALOG[0])
        }
    }

    #[test]
    fn generates_one_per_tier_once_per_week() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut weekly = WeeklyChallenges::default();
        let wednesday = date(2024, 1, 3);

        assert!(weekly.generate(wednesday, &mut rng));
        assert_eq!(weekly.week_start, Some(date(2024, 1, 1)));
        let tiers: Vec<Difficulty> = weekly.active.iter().map(|c| c.difficulty).collect();
        assert_eq!(tiers, Difficulty::ALL.to_vec());
        assert!(weekly.active.iter().all(|c| c.progress == 0 && !c.completed));

        let before = weekly.clone();
        assert!(!weekly.generate(date(2024, 1, 7), &mut rng));
        assert_eq!(weekly, before);

        assert!(weekly.generate(date(2024, 1, 8), &mut rng));
        assert_eq!(weekly.week_start, Some(date(2024, 1, 8)));
    }

    #[test]
    fn counter_crosses_exactly_once() {
        let today = date(2024, 1, 2);
        let mut weekly = with_active(counter(5), today);

        assert!(weekly.update_progress(ChallengeKind::TasksCompleted, 3, today).is_empty());
        assert_eq!(weekly.active[0].progress, 3);
        assert!(!weekly.active[0].completed);

        let crossed = weekly.update_progress(ChallengeKind::TasksCompleted, 2, today);
        assert_eq!(crossed.len(), 1);
        assert!(weekly.active[0].completed);

        assert!(weekly.update_progress(ChallengeKind::TasksCompleted, 4, today).is_empty());
        assert_eq!(weekly.completed_total, 1);
        assert_eq!(weekly.active[0].progress, 5);
    }

    #[test]
    fn set_progress_overwrites() {
        let today = date(2024, 1, 2);
        let streak = Challenge::from(CATALOG.iter().find(|t| t.id == "streak_5").unwrap());
        let mut weekly = with_active(streak, today);

        weekly.set_progress(ChallengeKind::Streak, 3, today);
        weekly.set_progress(ChallengeKind::Streak, 1, today);
        assert_eq!(weekly.active[0].progress, 1);
        assert_eq!(weekly.set_progress(ChallengeKind::Streak, 5, today).len(), 1);
        assert!(weekly.set_progress(ChallengeKind::Streak, 6, today).is_empty());
    }

    #[test]
    fn other_kinds_are_ignored() {
        let today = date(2024, 1, 2);
        let mut weekly = with_active(counter(1), today);
        assert!(weekly.update_progress(ChallengeKind::FocusTime, 100, today).is_empty());
        assert_eq!(weekly.active[0].progress, 0);
    }

    #[test]
    fn stale_week_gets_no_progress() {
        let mut weekly = with_active(counter(1), date(2024, 1, 2));
        let next_week = date(2024, 1, 9);
        assert!(weekly.update_progress(ChallengeKind::TasksCompleted, 5, next_week).is_empty());
        assert_eq!(weekly.active[0].progress, 0);
    }

    #[test]
    fn each_tier_has_templates() {
        for tier in Difficulty::ALL {
            assert!(CATALOG.iter().any(|t| t.difficulty == tier));
        }
    }
}
