//! Application context owning all three aggregates.
//!
//! The task engine holds the goal board and the gamification state as its
//! injected sinks, so a completion reaches both within the same call. The
//! planner adds the operations that span aggregates: cascading deletes, the
//! MIT cap and the once-a-day housekeeping pass.

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::ProjectConfig;
use crate::error::{EngineError, ImportError};
use crate::gamify::{Challenge, Gamification, LevelInfo, Stats};
use crate::goals::{AreaStats, GoalBoard, GoalBoardSnapshot};
use crate::lifecycle::TaskEngine;
use crate::model::goal::{Goal, Milestone, NewGoal, NewMilestone};
use crate::model::task::Task;
use crate::snapshot::{self, ExportDocument};

type Result<T> = std::result::Result<T, EngineError>;

/// Engine type the planner drives.
pub type PlannerEngine<C> = TaskEngine<GoalBoard, Gamification, C>;

/// Serializable state of every aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSnapshot {
    pub tasks: Vec<Task>,
    pub goals: GoalBoardSnapshot,
    pub stats: Stats,
}

/// What the daily housekeeping pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayStart {
    pub expired_mits: usize,
    pub challenges_generated: bool,
    pub pruned_days: usize,
}

#[derive(Debug)]
pub struct Planner<C = SystemClock, R = StdRng> {
    engine: PlannerEngine<C>,
    config: ProjectConfig,
    rng: R,
}

impl Planner<SystemClock, StdRng> {
    /// Planner on the wall clock with an entropy-seeded RNG.
    #[must_use]
    pub fn open(snapshot: PlannerSnapshot, config: ProjectConfig) -> Self {
        Self::with_parts(snapshot, config, SystemClock, StdRng::from_entropy())
    }
}

impl<C: Clock, R: Rng> Planner<C, R> {
    /// Rehydrate from a snapshot. Milestone progress caches are recomputed
    /// from the tasks.
    pub fn with_parts(snapshot: PlannerSnapshot, config: ProjectConfig, clock: C, rng: R) -> Self {
        let gamification = Gamification::new(snapshot.stats, config.xp, config.challenges.enabled);
        let board = GoalBoard::from_snapshot(snapshot.goals);
        let mut engine = TaskEngine::new(board, gamification, clock);
        engine.load(snapshot.tasks);
        Self {
            engine,
            config,
            rng,
        }
    }

    // ── aggregate access ─────────────────────────────────────────────────

    #[must_use]
    pub const fn engine(&self) -> &PlannerEngine<C> {
        &self.engine
    }

    pub const fn engine_mut(&mut self) -> &mut PlannerEngine<C> {
        &mut self.engine
    }

    #[must_use]
    pub const fn goals(&self) -> &GoalBoard {
        self.engine.milestones()
    }

    #[must_use]
    pub const fn gamification(&self) -> &Gamification {
        self.engine.gamification()
    }

    pub const fn gamification_mut(&mut self) -> &mut Gamification {
        self.engine.gamification_mut()
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.engine.clock().today()
    }

    // ── housekeeping ─────────────────────────────────────────────────────

    /// Sweep stale MITs, draw this week's challenges if needed and prune old
    /// per-day stats. Safe to call any number of times per day.
    pub fn start_day(&mut self) -> DayStart {
        let today = self.today();
        let expired_mits = self.engine.clear_expired_mits();
        let challenges_generated = self
            .engine
            .gamification_mut()
            .generate_weekly_challenges(today, &mut self.rng);
        let keep_days = self.config.history.keep_days;
        let pruned_days = self
            .engine
            .gamification_mut()
            .prune_history(today, keep_days);

        let outcome = DayStart {
            expired_mits,
            challenges_generated,
            pruned_days,
        };
        if challenges_generated || expired_mits > 0 {
            info!(?outcome, "day started");
        }
        outcome
    }

    // ── cross-aggregate operations ───────────────────────────────────────

    /// Flag a task as one of today's MITs, refusing once the configured daily
    /// cap is reached. Re-selecting a current MIT is a no-op.
    pub fn select_mit(&mut self, id: &str) -> Result<()> {
        let today = self.today();
        let task = self
            .engine
            .task(id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        if task.is_mit_on(today) {
            return Ok(());
        }
        let cap = self.config.mit.daily_cap;
        if self.engine.today_mits().len() >= cap {
            return Err(EngineError::MitCapReached { cap });
        }
        self.engine.set_mit(id, true)
    }

    pub fn add_goal(&mut self, fields: NewGoal) -> Result<Goal> {
        let now = self.engine.clock().now();
        self.engine.milestones_mut().add_goal(fields, now)
    }

    pub fn complete_goal(&mut self, id: &str) -> Result<()> {
        let now = self.engine.clock().now();
        self.engine.milestones_mut().complete_goal(id, now)
    }

    /// Add a milestone and seed its progress from tasks that already link
    /// to it.
    pub fn add_milestone(&mut self, fields: NewMilestone) -> Result<Milestone> {
        let now = self.engine.clock().now();
        let milestone = self.engine.milestones_mut().add_milestone(fields, now)?;
        self.engine.refresh_milestone_progress(&milestone.id);
        Ok(milestone)
    }

    /// Delete a goal, its milestones, and every task link to either.
    /// Returns the number of tasks unlinked.
    pub fn delete_goal(&mut self, id: &str) -> Result<usize> {
        let removed = self.engine.milestones_mut().delete_goal(id)?;
        let unlinked = self.engine.unlink_milestones(Some(id), &removed);
        debug!(goal_id = id, milestones = removed.len(), unlinked, "goal cascade");
        Ok(unlinked)
    }

    /// Delete one milestone and unlink its tasks. Returns the number of
    /// tasks unlinked.
    pub fn delete_milestone(&mut self, id: &str) -> Result<usize> {
        let removed = self.engine.milestones_mut().delete_milestone(id)?;
        let unlinked = self.engine.unlink_milestones(None, &[removed.id]);
        Ok(unlinked)
    }

    /// Log a focus session.
    pub fn add_focus_time(&mut self, seconds: u64) {
        let today = self.today();
        self.engine.gamification_mut().add_focus_time(seconds, today);
    }

    // ── read models ──────────────────────────────────────────────────────

    #[must_use]
    pub fn goal_progress(&self, goal_id: &str) -> u8 {
        self.goals().goal_progress(goal_id)
    }

    #[must_use]
    pub fn area_stats(&self) -> Vec<AreaStats> {
        self.goals().area_stats()
    }

    #[must_use]
    pub fn level_info(&self) -> LevelInfo {
        self.gamification().level_info()
    }

    #[must_use]
    pub fn challenge_status(&self) -> &[Challenge] {
        self.gamification().current_challenges(self.today())
    }

    // ── snapshot & import/export ─────────────────────────────────────────

    #[must_use]
    pub fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot {
            tasks: self.engine.snapshot(),
            goals: self.goals().snapshot(),
            stats: self.gamification().stats().clone(),
        }
    }

    #[must_use]
    pub fn export(&self) -> ExportDocument {
        snapshot::export(
            self.engine.tasks(),
            Some(self.gamification().stats()),
            self.engine.clock().now(),
        )
    }

    /// Replace the task collection (and the stats, when the payload has
    /// them). On error nothing changes. Returns the number of tasks loaded.
    pub fn import_json(&mut self, json: &str) -> std::result::Result<usize, ImportError> {
        let data = snapshot::import(json)?;
        let count = data.tasks.len();
        self.engine.load(data.tasks);
        if let Some(stats) = data.stats {
            self.engine.gamification_mut().replace_stats(stats);
        }
        info!(count, "import applied");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::task::NewTask;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn planner_on(today: NaiveDate) -> Planner<FixedClock, StdRng> {
        Planner::with_parts(
            PlannerSnapshot::default(),
            ProjectConfig::default(),
            FixedClock::on(today),
            StdRng::seed_from_u64(42),
        )
    }

    fn add(planner: &mut Planner<FixedClock, StdRng>, title: &str) -> String {
        planner
            .engine_mut()
            .add_task(NewTask::titled(title))
            .unwrap()
            .id
    }

    #[test]
    fn mit_cap_is_enforced_by_planner() {
        let mut planner = planner_on(date(2024, 1, 1));
        let ids: Vec<String> = (0..4).map(|i| add(&mut planner, &format!("t{i}"))).collect();

        for id in &ids[..3] {
            planner.select_mit(id).unwrap();
        }
        assert_eq!(
            planner.select_mit(&ids[3]),
            Err(EngineError::MitCapReached { cap: 3 })
        );
        // Re-selecting an existing MIT is fine at the cap.
        planner.select_mit(&ids[0]).unwrap();

        planner.engine_mut().complete_task(&ids[0], None).unwrap();
        planner.select_mit(&ids[3]).unwrap();
    }

    #[test]
    fn start_day_sweeps_and_generates() {
        let mut planner = planner_on(date(2024, 1, 1));
        let id = add(&mut planner, "x");
        planner.select_mit(&id).unwrap();

        let first = planner.start_day();
        assert!(first.challenges_generated);
        assert_eq!(first.expired_mits, 0);
        assert_eq!(planner.challenge_status().len(), 3);

        planner.engine().clock().set_date(date(2024, 1, 2));
        let second = planner.start_day();
        assert_eq!(second.expired_mits, 1);
        assert!(!second.challenges_generated);
        assert!(!planner.engine().task(&id).unwrap().is_mit);
    }

    #[test]
    fn deleting_a_goal_unlinks_tasks() {
        let mut planner = planner_on(date(2024, 1, 1));
        let goal = planner
            .add_goal(NewGoal {
                title: "Ship v1".into(),
                ..NewGoal::default()
            })
            .unwrap();
        let milestone = planner
            .add_milestone(NewMilestone {
                goal_id: goal.id.clone(),
                title: "beta".into(),
                ..NewMilestone::default()
            })
            .unwrap();
        let task = planner
            .engine_mut()
            .add_task(NewTask {
                title: "write docs".into(),
                goal_id: Some(goal.id.clone()),
                milestone_id: Some(milestone.id.clone()),
                ..NewTask::default()
            })
            .unwrap();

        assert_eq!(planner.delete_goal(&goal.id).unwrap(), 1);
        let task = planner.engine().task(&task.id).unwrap();
        assert!(task.goal_id.is_none());
        assert!(task.milestone_id.is_none());
        assert!(planner.goals().milestone(&milestone.id).is_none());
    }

    #[test]
    fn new_milestone_picks_up_existing_links() {
        let mut planner = planner_on(date(2024, 1, 1));
        let goal = planner
            .add_goal(NewGoal {
                title: "g".into(),
                ..NewGoal::default()
            })
            .unwrap();
        let milestone = planner
            .add_milestone(NewMilestone {
                goal_id: goal.id.clone(),
                title: "m".into(),
                ..NewMilestone::default()
            })
            .unwrap();
        let id = planner
            .engine_mut()
            .add_task(NewTask {
                title: "done already".into(),
                milestone_id: Some(milestone.id.clone()),
                ..NewTask::default()
            })
            .unwrap()
            .id;
        planner.engine_mut().complete_task(&id, None).unwrap();

        let snapshot = planner.snapshot();
        let reopened = Planner::with_parts(
            snapshot,
            ProjectConfig::default(),
            FixedClock::on(date(2024, 1, 1)),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(reopened.goals().milestone_progress(&milestone.id), Some(100));
        assert_eq!(reopened.goal_progress(&goal.id), 100);
    }

    #[test]
    fn failed_import_changes_nothing() {
        let mut planner = planner_on(date(2024, 1, 1));
        add(&mut planner, "keep me");
        let before = planner.snapshot();

        assert!(planner.import_json(r#"{"tasks": "nope"}"#).is_err());
        assert_eq!(planner.snapshot(), before);
    }

    #[test]
    fn export_then_import_restores_tasks_and_stats() {
        let mut planner = planner_on(date(2024, 1, 1));
        let id = add(&mut planner, "x");
        planner.engine_mut().complete_task(&id, None).unwrap();
        let json = serde_json::to_string(&planner.export()).unwrap();

        let mut other = planner_on(date(2024, 1, 1));
        assert_eq!(other.import_json(&json).unwrap(), 1);
        assert_eq!(other.engine().tasks(), planner.engine().tasks());
        assert_eq!(other.gamification().stats(), planner.gamification().stats());
    }
}
