//! Goal and milestone aggregate.
//!
//! Milestone progress is never computed here. The task engine pushes the
//! linked-task completion ratio through [`MilestoneProgressSink`]; the board
//! stores it and derives goal progress from the cached values at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::EngineError;
use crate::id::{self, GOAL_PREFIX, MILESTONE_PREFIX};
use crate::lifecycle::MilestoneProgressSink;
use crate::model::goal::{
    Goal, GoalPatch, GoalPriority, GoalStatus, ImpactEffort, LifeArea, Milestone,
    MilestonePatch, MilestoneStatus, NewGoal, NewMilestone,
};

type Result<T> = std::result::Result<T, EngineError>;

/// Per-area rollup for the life-area overview.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaStats {
    pub area: LifeArea,
    pub active_goals: usize,
    pub total_goals: usize,
    /// Mean goal progress over the area's active goals, 0 when none.
    pub average_progress: u8,
}

/// Persisted form of the board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalBoardSnapshot {
    pub goals: Vec<Goal>,
    pub milestones: Vec<Milestone>,
}

/// Owned goal and milestone collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalBoard {
    goals: Vec<Goal>,
    milestones: Vec<Milestone>,
}

impl GoalBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── goals ────────────────────────────────────────────────────────────

    pub fn add_goal(&mut self, fields: NewGoal, now: DateTime<Utc>) -> Result<Goal> {
        let title = fields.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::EmptyTitle);
        }
        check_priority(fields.priority)?;

        let goal = Goal {
            id: id::new_id(GOAL_PREFIX),
            title,
            description: fields.description,
            why: fields.why,
            identity: fields.identity,
            area: fields.area,
            deadline: fields.deadline,
            timeframe: fields.timeframe,
            smart: fields.smart,
            priority: fields.priority,
            status: GoalStatus::Active,
            created_at: now,
            completed_at: None,
        };
        debug!(goal_id = %goal.id, area = %goal.area, "goal added");
        self.goals.insert(0, goal.clone());
        Ok(goal)
    }

    pub fn update_goal(&mut self, id: &str, patch: GoalPatch) -> Result<Goal> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(EngineError::EmptyTitle);
            }
        }
        if let Some(priority) = patch.priority {
            check_priority(priority)?;
        }

        let goal = self.goal_mut(id)?;
        if let Some(title) = patch.title {
            goal.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            goal.description = description;
        }
        if let Some(why) = patch.why {
            goal.why = why;
        }
        if let Some(identity) = patch.identity {
            goal.identity = identity;
        }
        if let Some(area) = patch.area {
            goal.area = area;
        }
        if let Some(deadline) = patch.deadline {
            goal.deadline = deadline;
        }
        if let Some(timeframe) = patch.timeframe {
            goal.timeframe = timeframe;
        }
        if let Some(smart) = patch.smart {
            goal.smart = smart;
        }
        if let Some(priority) = patch.priority {
            goal.priority = priority;
        }
        Ok(goal.clone())
    }

    pub fn complete_goal(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        let goal = self.goal_mut(id)?;
        goal.status = GoalStatus::Completed;
        goal.completed_at.get_or_insert(now);
        Ok(())
    }

    pub fn pause_goal(&mut self, id: &str) -> Result<()> {
        self.set_goal_status(id, GoalStatus::Paused)
    }

    /// Back to active from paused or completed.
    pub fn resume_goal(&mut self, id: &str) -> Result<()> {
        self.set_goal_status(id, GoalStatus::Active)
    }

    /// Remove a goal and its milestones. Returns the removed milestone IDs
    /// so the caller can unlink tasks.
    pub fn delete_goal(&mut self, id: &str) -> Result<Vec<String>> {
        let idx = self
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| EngineError::goal_not_found(id))?;
        self.goals.remove(idx);

        let (removed, kept): (Vec<Milestone>, Vec<Milestone>) =
            std::mem::take(&mut self.milestones)
                .into_iter()
                .partition(|m| m.goal_id == id);
        self.milestones = kept;
        debug!(goal_id = id, milestones = removed.len(), "goal deleted");
        Ok(removed.into_iter().map(|m| m.id).collect())
    }

    // ── milestones ───────────────────────────────────────────────────────

    pub fn add_milestone(&mut self, fields: NewMilestone, now: DateTime<Utc>) -> Result<Milestone> {
        let title = fields.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::EmptyTitle);
        }
        if self.goal(&fields.goal_id).is_none() {
            return Err(EngineError::goal_not_found(&fields.goal_id));
        }

        let milestone = Milestone {
            id: id::new_id(MILESTONE_PREFIX),
            goal_id: fields.goal_id,
            title,
            deadline: fields.deadline,
            target_value: fields.target_value,
            current_value: fields.target_value.map(|_| 0.0),
            unit: fields.unit,
            status: MilestoneStatus::Active,
            progress: 0,
            created_at: now,
        };
        debug!(milestone_id = %milestone.id, goal_id = %milestone.goal_id, "milestone added");
        self.milestones.push(milestone.clone());
        Ok(milestone)
    }

    pub fn update_milestone(&mut self, id: &str, patch: MilestonePatch) -> Result<Milestone> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(EngineError::EmptyTitle);
            }
        }
        let milestone = self.milestone_mut(id)?;
        if let Some(title) = patch.title {
            milestone.title = title.trim().to_string();
        }
        if let Some(deadline) = patch.deadline {
            milestone.deadline = deadline;
        }
        if let Some(target) = patch.target_value {
            milestone.target_value = target;
        }
        if let Some(current) = patch.current_value {
            milestone.current_value = current;
        }
        if let Some(unit) = patch.unit {
            milestone.unit = unit;
        }
        Ok(milestone.clone())
    }

    /// Mark a milestone completed. Only the status changes; progress stays
    /// whatever the linked tasks say.
    pub fn complete_milestone(&mut self, id: &str) -> Result<()> {
        self.milestone_mut(id)?.status = MilestoneStatus::Completed;
        Ok(())
    }

    /// Remove one milestone. The caller unlinks its tasks.
    pub fn delete_milestone(&mut self, id: &str) -> Result<Milestone> {
        let idx = self
            .milestones
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| EngineError::milestone_not_found(id))?;
        Ok(self.milestones.remove(idx))
    }

    // ── selectors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    #[must_use]
    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    #[must_use]
    pub fn milestone(&self, id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn milestones_for(&self, goal_id: &str) -> Vec<&Milestone> {
        self.milestones
            .iter()
            .filter(|m| m.goal_id == goal_id)
            .collect()
    }

    /// Cached progress of one milestone.
    #[must_use]
    pub fn milestone_progress(&self, id: &str) -> Option<u8> {
        self.milestone(id).map(|m| m.progress)
    }

    /// Unweighted mean of the goal's milestone progress, rounded to the
    /// nearest percent. 0 for a goal without milestones or an unknown ID.
    #[must_use]
    pub fn goal_progress(&self, goal_id: &str) -> u8 {
        let values: Vec<u8> = self
            .milestones_for(goal_id)
            .into_iter()
            .map(|m| m.progress)
            .collect();
        mean(&values)
    }

    /// One entry per life area, in catalog order.
    #[must_use]
    pub fn area_stats(&self) -> Vec<AreaStats> {
        LifeArea::ALL
            .iter()
            .map(|&area| {
                let in_area: Vec<&Goal> = self.goals.iter().filter(|g| g.area == area).collect();
                let active: Vec<u8> = in_area
                    .iter()
                    .filter(|g| g.status == GoalStatus::Active)
                    .map(|g| self.goal_progress(&g.id))
                    .collect();
                AreaStats {
                    area,
                    active_goals: active.len(),
                    total_goals: in_area.len(),
                    average_progress: mean(&active),
                }
            })
            .collect()
    }

    // ── snapshot ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn snapshot(&self) -> GoalBoardSnapshot {
        GoalBoardSnapshot {
            goals: self.goals.clone(),
            milestones: self.milestones.clone(),
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: GoalBoardSnapshot) -> Self {
        Self {
            goals: snapshot.goals,
            milestones: snapshot.milestones,
        }
    }

    // ── internals ────────────────────────────────────────────────────────

    fn set_goal_status(&mut self, id: &str, status: GoalStatus) -> Result<()> {
        let goal = self.goal_mut(id)?;
        goal.status = status;
        if status != GoalStatus::Completed {
            goal.completed_at = None;
        }
        Ok(())
    }

    fn goal_mut(&mut self, id: &str) -> Result<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| EngineError::goal_not_found(id))
    }

    fn milestone_mut(&mut self, id: &str) -> Result<&mut Milestone> {
        self.milestones
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| EngineError::milestone_not_found(id))
    }
}

impl MilestoneProgressSink for GoalBoard {
    fn milestone_progress_changed(&mut self, milestone_id: &str, progress: u8) {
        if let Some(milestone) = self.milestones.iter_mut().find(|m| m.id == milestone_id) {
            milestone.progress = progress.min(100);
        }
    }

    fn known_milestones(&self) -> Vec<String> {
        self.milestones.iter().map(|m| m.id.clone()).collect()
    }
}

/// Impact/effort classification of a goal.
#[must_use]
pub const fn goal_quadrant(goal: &Goal) -> ImpactEffort {
    goal.priority.quadrant()
}

/// Goals grouped by impact/effort cell.
#[must_use]
pub fn goals_by_quadrant(goals: &[Goal]) -> BTreeMap<&'static str, Vec<&Goal>> {
    let mut grouped: BTreeMap<&'static str, Vec<&Goal>> = BTreeMap::new();
    for goal in goals {
        grouped
            .entry(goal_quadrant(goal).as_str())
            .or_default()
            .push(goal);
    }
    grouped
}

fn check_priority(priority: GoalPriority) -> Result<()> {
    if priority.is_valid() {
        Ok(())
    } else {
        Err(EngineError::InvalidField {
            field: "priority",
            reason: format!(
                "impact and effort must be 1-5 (got {}/{})",
                priority.impact, priority.effort
            ),
        })
    }
}

fn mean(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: usize = values.iter().map(|&v| usize::from(v)).sum();
    let n = values.len();
    u8::try_from(((2 * sum + n) / (2 * n)).min(100)).unwrap_or(100)
}
