//! `cad edit`: change task fields without touching its stage.

use anyhow::Result;
use cadence_core::model::task::{Priority, Recurrence, RecurrenceKind, TaskPatch};
use clap::Args;
use std::path::Path;

use super::{parse_date, parse_enum, parse_time, render_outcome, require_positive};
use crate::output::OutputMode;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description (empty string clears it).
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority: high, medium or low.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// New due date (YYYY-MM-DD, today, tomorrow or +N).
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,

    /// Clear the due date and time.
    #[arg(long)]
    pub no_due: bool,

    /// New due time (HH:MM).
    #[arg(long = "at")]
    pub due_time: Option<String>,

    /// New estimate in minutes.
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Replace the tag set (repeatable).
    #[arg(short, long = "tag", conflicts_with = "no_tags")]
    pub tags: Vec<String>,

    /// Remove every tag.
    #[arg(long)]
    pub no_tags: bool,

    /// Recurrence: daily, weekly or monthly.
    #[arg(long, conflicts_with = "no_repeat")]
    pub repeat: Option<String>,

    /// Recurrence interval, in units of `--repeat`.
    #[arg(long, default_value_t = 1, requires = "repeat")]
    pub every: u32,

    /// Stop the task from recurring.
    #[arg(long)]
    pub no_repeat: bool,

    /// Link to a goal (ID or unique prefix).
    #[arg(long, conflicts_with = "no_goal")]
    pub goal: Option<String>,

    /// Unlink from its goal and milestone.
    #[arg(long)]
    pub no_goal: bool,

    /// Link to a milestone (ID or unique prefix); implies its goal.
    #[arg(long, conflicts_with = "no_goal")]
    pub milestone: Option<String>,
}

pub fn run_edit(args: &EditArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let patch = build_patch(args, &session)?;
    let task = session.planner.engine_mut().update_task(&id, patch)?;
    session.save()?;

    render_outcome(
        output,
        &format!("Updated {}", task.id),
        serde_json::to_value(&task)?,
        &[],
    )
}

fn build_patch(args: &EditArgs, session: &Session) -> Result<TaskPatch> {
    let today = session.planner.today();
    let mut patch = TaskPatch {
        title: args.title.clone(),
        description: args.description.clone().map(Some),
        priority: args
            .priority
            .as_deref()
            .map(parse_enum::<Priority>)
            .transpose()?,
        estimated_minutes: args.estimate.map(Some),
        ..TaskPatch::default()
    };

    if args.no_due {
        patch.due_date = Some(None);
        patch.due_time = Some(None);
    } else {
        if let Some(raw) = args.due.as_deref() {
            patch.due_date = Some(Some(parse_date(raw, today)?));
        }
        if let Some(raw) = args.due_time.as_deref() {
            patch.due_time = Some(Some(parse_time(raw)?));
        }
    }

    if args.no_tags {
        patch.tags = Some(Vec::new());
    } else if !args.tags.is_empty() {
        patch.tags = Some(args.tags.clone());
    }

    if args.no_repeat {
        patch.recurrence = Some(None);
    } else if let Some(raw) = args.repeat.as_deref() {
        patch.recurrence = Some(Some(Recurrence::new(
            parse_enum::<RecurrenceKind>(raw)?,
            require_positive(args.every, "--every")?,
        )));
    }

    if args.no_goal {
        patch.goal_id = Some(None);
        patch.milestone_id = Some(None);
    } else {
        if let Some(raw) = args.goal.as_deref() {
            patch.goal_id = Some(Some(session.resolve_goal(raw)?));
        }
        if let Some(raw) = args.milestone.as_deref() {
            let milestone_id = session.resolve_milestone(raw)?;
            if patch.goal_id.is_none() {
                patch.goal_id = session
                    .planner
                    .goals()
                    .milestone(&milestone_id)
                    .map(|m| Some(m.goal_id.clone()));
            }
            patch.milestone_id = Some(Some(milestone_id));
        }
    }
    Ok(patch)
}
