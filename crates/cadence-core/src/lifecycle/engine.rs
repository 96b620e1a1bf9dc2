use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::{GamificationSink, MilestoneProgressSink, milestone_progress, next_occurrence};
use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;
use crate::id::{self, SUBTASK_PREFIX, TASK_PREFIX};
use crate::model::task::{NewTask, Quadrant, Stage, Subtask, Task, TaskPatch};

type Result<T> = std::result::Result<T, EngineError>;

/// Owner of the task collection.
///
/// Every mutator looks tasks up by ID and fails with
/// [`EngineError::TaskNotFound`] when the ID is unknown. Milestone progress
/// is pushed into `M` whenever a linked task's done-ness changes, and task
/// completions are reported to `G` after the milestone update.
///
/// The engine never caps the number of MITs; that policy belongs to the
/// caller (see [`crate::planner::Planner::select_mit`]).
pub struct TaskEngine<M, G, C = SystemClock> {
    tasks: Vec<Task>,
    milestones: M,
    gamification: G,
    clock: C,
}

impl<M, G, C> std::fmt::Debug for TaskEngine<M, G, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEngine")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl<M, G, C> TaskEngine<M, G, C>
where
    M: MilestoneProgressSink,
    G: GamificationSink,
    C: Clock,
{
    /// Build an empty engine around its collaborators.
    pub const fn new(milestones: M, gamification: G, clock: C) -> Self {
        Self {
            tasks: Vec::new(),
            milestones,
            gamification,
            clock,
        }
    }

    // ── collaborators ────────────────────────────────────────────────────

    pub const fn milestones(&self) -> &M {
        &self.milestones
    }

    pub const fn milestones_mut(&mut self) -> &mut M {
        &mut self.milestones
    }

    pub const fn gamification(&self) -> &G {
        &self.gamification
    }

    pub const fn gamification_mut(&mut self) -> &mut G {
        &mut self.gamification
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    // ── capture & edit ───────────────────────────────────────────────────

    /// Capture a new task into the inbox. The task is inserted at the head
    /// of the collection.
    pub fn add_task(&mut self, fields: NewTask) -> Result<Task> {
        let title = fields.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::EmptyTitle);
        }
        if let Some(rule) = fields.recurrence {
            validate_interval(rule.interval)?;
        }

        let now = self.clock.now();
        let task = Task {
            id: id::new_id(TASK_PREFIX),
            title,
            description: fields.description.filter(|d| !d.trim().is_empty()),
            stage: Stage::Inbox,
            priority: fields.priority.unwrap_or_default(),
            due_date: fields.due_date,
            due_time: fields.due_time,
            estimated_minutes: fields.estimated_minutes,
            tags: normalize_tags(fields.tags),
            subtasks: fields
                .subtasks
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| Subtask {
                    id: id::new_id(SUBTASK_PREFIX),
                    title: s.trim().to_string(),
                    completed: false,
                })
                .collect(),
            is_recurring: fields.recurrence.is_some(),
            recurrence: fields.recurrence,
            goal_id: fields.goal_id,
            milestone_id: fields.milestone_id,
            created_at: now,
            ..Task::default()
        };

        debug!(task_id = %task.id, priority = %task.priority, "task captured");
        self.tasks.insert(0, task.clone());
        if let Some(milestone_id) = task.milestone_id.clone() {
            self.refresh_milestone_progress(&milestone_id);
        }
        Ok(task)
    }

    /// Apply field edits. Relinking to another milestone refreshes both the
    /// old and the new milestone.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(EngineError::EmptyTitle);
            }
        }
        if let Some(Some(rule)) = patch.recurrence {
            validate_interval(rule.interval)?;
        }

        let now = self.clock.now();
        let task = self.task_mut(id)?;
        let old_milestone = task.milestone_id.clone();

        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(due_time) = patch.due_time {
            task.due_time = due_time;
        }
        if let Some(estimate) = patch.estimated_minutes {
            task.estimated_minutes = estimate;
        }
        if let Some(tags) = patch.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(recurrence) = patch.recurrence {
            task.recurrence = recurrence;
            task.is_recurring = recurrence.is_some();
        }
        if let Some(goal_id) = patch.goal_id {
            task.goal_id = goal_id;
        }
        if let Some(milestone_id) = patch.milestone_id {
            task.milestone_id = milestone_id;
        }
        task.updated_at = Some(now);

        let updated = task.clone();
        if old_milestone != updated.milestone_id {
            for milestone_id in old_milestone.iter().chain(updated.milestone_id.iter()) {
                self.refresh_milestone_progress(milestone_id);
            }
        }
        Ok(updated)
    }

    // ── stage moves ──────────────────────────────────────────────────────

    /// Move a task one hop along the stage transition table.
    ///
    /// An illegal hop returns [`EngineError::IllegalTransition`] and leaves
    /// the task untouched. Moving into `done` this way only flips the stage
    /// and completion flags; it does not spawn recurrences or report a
    /// completion. Use [`TaskEngine::complete_task`] for that.
    pub fn move_to_stage(&mut self, id: &str, target: Stage) -> Result<()> {
        let task = self.task(id).ok_or_else(|| EngineError::task_not_found(id))?;
        if let Err(err) = task.stage.can_transition_to(target) {
            warn!(task_id = id, from = %err.from, to = %err.to, "rejected stage transition");
            return Err(err.into());
        }
        self.apply_stage(id, target)
    }

    /// Classify into an Eisenhower quadrant and force `prioritized`,
    /// whatever the current stage.
    pub fn prioritize_task(&mut self, id: &str, quadrant: Quadrant) -> Result<()> {
        self.task_mut(id)?.quadrant = Some(quadrant);
        self.apply_stage(id, Stage::Prioritized)
    }

    /// Put a task on the calendar and force `scheduled`.
    pub fn schedule_task(
        &mut self,
        id: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<()> {
        let task = self.task_mut(id)?;
        task.scheduled_for = Some(date);
        task.scheduled_time = time;
        self.apply_stage(id, Stage::Scheduled)
    }

    /// Force `in_progress`.
    pub fn start_task(&mut self, id: &str) -> Result<()> {
        self.apply_stage(id, Stage::InProgress)
    }

    /// Park a task in `someday`, whatever the current stage.
    pub fn move_to_someday(&mut self, id: &str) -> Result<()> {
        self.apply_stage(id, Stage::Someday)
    }

    /// Bring a task back from `someday` into the inbox.
    pub fn activate_from_someday(&mut self, id: &str) -> Result<()> {
        self.apply_stage(id, Stage::Inbox)
    }

    /// Mark a task done.
    ///
    /// Side effects run in this order:
    /// 1. a recurring task with a due date spawns its next occurrence into
    ///    the inbox,
    /// 2. the linked milestone's progress is recomputed and pushed,
    /// 3. the gamification sink receives the completion.
    ///
    /// Returns the task as it was before completion. Completing a task that
    /// is already done returns it unchanged with no side effects.
    pub fn complete_task(&mut self, id: &str, actual_minutes: Option<u32>) -> Result<Task> {
        let idx = self.position(id)?;
        let before = self.tasks[idx].clone();
        if before.stage.is_done() && before.completed {
            debug!(task_id = id, "task already complete");
            return Ok(before);
        }

        let now = self.clock.now();
        let today = self.clock.today();
        {
            let task = &mut self.tasks[idx];
            write_stage(task, Stage::Done, now);
            task.completed_at = Some(now);
            if actual_minutes.is_some() {
                task.actual_minutes = actual_minutes;
            }
        }

        if let Some(next) = spawn_next_occurrence(&before, now) {
            info!(
                task_id = id,
                next_id = %next.id,
                due = ?next.due_date,
                "spawned next occurrence"
            );
            self.tasks.insert(0, next);
        }

        if let Some(milestone_id) = &before.milestone_id {
            self.refresh_milestone_progress(milestone_id);
        }

        self.gamification.task_completed(&before, today);
        debug!(task_id = id, "task completed");
        Ok(before)
    }

    /// Reverse a completion. The stage falls back to `scheduled` when the
    /// task has a schedule date, else `prioritized` when it has a quadrant,
    /// else `inbox`. A task that is not complete is left alone.
    pub fn uncomplete_task(&mut self, id: &str) -> Result<()> {
        let task = self.task(id).ok_or_else(|| EngineError::task_not_found(id))?;
        if !task.stage.is_done() && !task.completed {
            return Ok(());
        }
        let target = if task.scheduled_for.is_some() {
            Stage::Scheduled
        } else if task.quadrant.is_some() {
            Stage::Prioritized
        } else {
            Stage::Inbox
        };
        self.apply_stage(id, target)
    }

    /// Strip triage and schedule information and send the task back to the
    /// inbox, from any stage.
    pub fn reset_to_inbox(&mut self, id: &str) -> Result<()> {
        let task = self.task_mut(id)?;
        task.quadrant = None;
        task.scheduled_for = None;
        task.scheduled_time = None;
        self.apply_stage(id, Stage::Inbox)
    }

    /// Remove a task. Milestones simply stop counting it.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        if let Some(milestone_id) = &removed.milestone_id {
            self.refresh_milestone_progress(milestone_id);
        }
        debug!(task_id = id, "task deleted");
        Ok(removed)
    }

    // ── MIT ──────────────────────────────────────────────────────────────

    /// Flag or unflag a task as one of today's MITs. No cap is applied here.
    pub fn set_mit(&mut self, id: &str, flag: bool) -> Result<()> {
        let today = self.clock.today();
        let task = self.task_mut(id)?;
        task.is_mit = flag;
        task.mit_date = flag.then_some(today);
        Ok(())
    }

    /// Clear MIT flags stamped on any day other than today, skipping
    /// completed tasks. Returns the number of tasks cleared.
    pub fn clear_expired_mits(&mut self) -> usize {
        let today = self.clock.today();
        let mut cleared = 0;
        for task in &mut self.tasks {
            if task.is_mit && task.mit_date != Some(today) && !task.completed {
                task.is_mit = false;
                task.mit_date = None;
                cleared += 1;
            }
        }
        if cleared > 0 {
            debug!(cleared, "cleared expired MITs");
        }
        cleared
    }

    /// Open tasks flagged as MIT for today.
    #[must_use]
    pub fn today_mits(&self) -> Vec<&Task> {
        let today = self.clock.today();
        self.tasks.iter().filter(|t| t.is_mit_on(today)).collect()
    }

    // ── subtasks ─────────────────────────────────────────────────────────

    pub fn add_subtask(&mut self, id: &str, title: &str) -> Result<Subtask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::EmptyTitle);
        }
        let subtask = Subtask {
            id: id::new_id(SUBTASK_PREFIX),
            title: title.to_string(),
            completed: false,
        };
        self.task_mut(id)?.subtasks.push(subtask.clone());
        Ok(subtask)
    }

    /// Flip a subtask's completion. The parent task is never completed as
    /// a side effect. Returns the new state.
    pub fn toggle_subtask(&mut self, id: &str, subtask_id: &str) -> Result<bool> {
        let subtask = self
            .task_mut(id)?
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| EngineError::SubtaskNotFound {
                task_id: id.to_string(),
                subtask_id: subtask_id.to_string(),
            })?;
        subtask.completed = !subtask.completed;
        Ok(subtask.completed)
    }

    pub fn delete_subtask(&mut self, id: &str, subtask_id: &str) -> Result<Subtask> {
        let task = self.task_mut(id)?;
        let idx = task
            .subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or_else(|| EngineError::SubtaskNotFound {
                task_id: id.to_string(),
                subtask_id: subtask_id.to_string(),
            })?;
        Ok(task.subtasks.remove(idx))
    }

    // ── cross-aggregate hooks ────────────────────────────────────────────

    /// Drop links to deleted milestones. A task's goal link is cleared only
    /// when `goal_id` names the deleted goal. Tasks themselves are kept.
    /// Returns the number of tasks touched.
    pub fn unlink_milestones(&mut self, goal_id: Option<&str>, milestone_ids: &[String]) -> usize {
        let doomed: BTreeSet<&str> = milestone_ids.iter().map(String::as_str).collect();
        let mut touched = 0;
        for task in &mut self.tasks {
            let mut changed = false;
            if task
                .milestone_id
                .as_deref()
                .is_some_and(|m| doomed.contains(m))
            {
                task.milestone_id = None;
                changed = true;
            }
            if goal_id.is_some() && task.goal_id.as_deref() == goal_id {
                task.goal_id = None;
                changed = true;
            }
            touched += usize::from(changed);
        }
        touched
    }

    /// Recompute one milestone's progress from the current tasks and push it
    /// to the milestone sink. This is the only place progress is computed.
    pub fn refresh_milestone_progress(&mut self, milestone_id: &str) {
        let progress = milestone_progress(&self.tasks, milestone_id);
        self.milestones
            .milestone_progress_changed(milestone_id, progress);
    }

    /// Recompute every milestone the sink knows about.
    pub fn refresh_all_milestones(&mut self) {
        for milestone_id in self.milestones.known_milestones() {
            self.refresh_milestone_progress(&milestone_id);
        }
    }

    // ── snapshot ─────────────────────────────────────────────────────────

    /// Full task collection for serialization.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Replace the whole collection, e.g. after rehydrating from storage.
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks
            .into_iter()
            .map(|mut t| {
                t.is_recurring = t.recurrence.is_some();
                t
            })
            .collect();
        self.refresh_all_milestones();
        debug!(count = self.tasks.len(), "task collection loaded");
    }

    // ── selectors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn by_stage(&self, stage: Stage) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.stage == stage).collect()
    }

    /// Task count per stage, zero-filled.
    #[must_use]
    pub fn stage_counts(&self) -> BTreeMap<Stage, usize> {
        let mut counts: BTreeMap<Stage, usize> = Stage::ALL.iter().map(|s| (*s, 0)).collect();
        for task in &self.tasks {
            *counts.entry(task.stage).or_default() += 1;
        }
        counts
    }

    /// Open tasks scheduled for or due today.
    #[must_use]
    pub fn today_tasks(&self) -> Vec<&Task> {
        let today = self.clock.today();
        self.tasks
            .iter()
            .filter(|t| !t.stage.is_done())
            .filter(|t| t.scheduled_for == Some(today) || t.due_date == Some(today))
            .collect()
    }

    /// Open tasks whose due date has passed.
    #[must_use]
    pub fn overdue_tasks(&self) -> Vec<&Task> {
        let today = self.clock.today();
        self.tasks
            .iter()
            .filter(|t| !t.stage.is_done() && t.stage != Stage::Someday)
            .filter(|t| t.due_date.is_some_and(|d| d < today))
            .collect()
    }

    #[must_use]
    pub fn tasks_for_milestone(&self, milestone_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.milestone_id.as_deref() == Some(milestone_id))
            .collect()
    }

    /// Case-insensitive substring match on title, description and tags.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
                    || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
            })
            .collect()
    }

    // ── internals ────────────────────────────────────────────────────────

    fn position(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))
    }

    /// Single entry point for stage writes after validation (or for the
    /// deliberately permissive convenience mutators).
    fn apply_stage(&mut self, id: &str, target: Stage) -> Result<()> {
        let now = self.clock.now();
        let task = self.task_mut(id)?;
        let from = task.stage;
        let done_changed = write_stage(task, target, now);
        let milestone_id = task.milestone_id.clone();
        debug!(task_id = id, %from, to = %target, "stage written");

        if done_changed {
            if let Some(milestone_id) = milestone_id {
                self.refresh_milestone_progress(&milestone_id);
            }
        }
        Ok(())
    }
}

/// Write `target` and keep the completion mirror in step with it. Returns
/// `true` when the task's done-ness changed.
fn write_stage(task: &mut Task, target: Stage, now: DateTime<Utc>) -> bool {
    let was_done = task.stage.is_done();
    task.stage = target;
    if target.is_done() {
        task.completed = true;
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
    } else {
        task.completed = false;
        task.completed_at = None;
    }
    task.updated_at = Some(now);
    was_done != target.is_done()
}

/// Fresh inbox copy of a recurring task at its next due date, or `None`
/// when the task does not recur or has no due date.
fn spawn_next_occurrence(task: &Task, now: DateTime<Utc>) -> Option<Task> {
    if !task.is_recurring {
        return None;
    }
    let rule = task.recurrence?;
    let next_due = next_occurrence(task.due_date?, rule)?;

    Some(Task {
        id: id::new_id(TASK_PREFIX),
        title: task.title.clone(),
        description: task.description.clone(),
        stage: Stage::Inbox,
        priority: task.priority,
        due_date: Some(next_due),
        due_time: task.due_time,
        estimated_minutes: task.estimated_minutes,
        tags: task.tags.clone(),
        subtasks: task
            .subtasks
            .iter()
            .map(|s| Subtask {
                completed: false,
                ..s.clone()
            })
            .collect(),
        recurrence: Some(rule),
        is_recurring: true,
        goal_id: task.goal_id.clone(),
        milestone_id: task.milestone_id.clone(),
        created_at: now,
        ..Task::default()
    })
}

fn validate_interval(interval: u32) -> Result<()> {
    if interval == 0 {
        return Err(EngineError::InvalidField {
            field: "recurrence.interval",
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(())
}

/// Trim, drop empties and de-duplicate case-insensitively, keeping the
/// first spelling and its position.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}
