//! Task lifecycle engine and the ports it pushes derived state through.

pub mod engine;
pub mod recurrence;

use chrono::NaiveDate;

use crate::model::task::Task;

pub use engine::TaskEngine;
pub use recurrence::next_occurrence;

/// Receiver of recomputed milestone progress.
///
/// The engine owns the task collection and is the only place milestone
/// progress is computed; implementors store what they are given.
pub trait MilestoneProgressSink {
    /// Store the recomputed `progress` (0..=100) for `milestone_id`.
    /// Unknown milestone IDs are ignored.
    fn milestone_progress_changed(&mut self, milestone_id: &str, progress: u8);

    /// IDs of every milestone the sink currently holds.
    fn known_milestones(&self) -> Vec<String>;
}

/// Receiver of task completion events.
pub trait GamificationSink {
    /// Called once per completion, after the milestone update, with the
    /// task as it was before it was marked done.
    fn task_completed(&mut self, task: &Task, today: NaiveDate);
}

/// Completion ratio of the tasks linked to `milestone_id`, rounded to the
/// nearest whole percent (halves round up). `0` when nothing is linked.
#[must_use]
pub fn milestone_progress<'a>(tasks: impl IntoIterator<Item = &'a Task>, milestone_id: &str) -> u8 {
    let (done, total) = tasks
        .into_iter()
        .filter(|t| t.milestone_id.as_deref() == Some(milestone_id))
        .fold((0usize, 0usize), |(done, total), t| {
            (done + usize::from(t.stage.is_done()), total + 1)
        });
    percent(done, total)
}

pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * done + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}
