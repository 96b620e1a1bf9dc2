//! `cad add`: capture a task into the inbox.

use anyhow::Result;
use cadence_core::model::task::{NewTask, Priority, Recurrence, RecurrenceKind};
use clap::Args;
use std::path::Path;

use super::{parse_date, parse_enum, parse_time, render_outcome, require_positive};
use crate::output::OutputMode;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title.
    pub title: String,

    /// Longer description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority: high, medium or low.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Due date (YYYY-MM-DD, today, tomorrow or +N).
    #[arg(long)]
    pub due: Option<String>,

    /// Due time (HH:MM).
    #[arg(long = "at")]
    pub due_time: Option<String>,

    /// Estimated effort in minutes.
    #[arg(long)]
    pub estimate: Option<u32>,

    /// Tag (repeatable).
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Subtask title (repeatable).
    #[arg(short, long = "subtask")]
    pub subtasks: Vec<String>,

    /// Recurrence: daily, weekly or monthly.
    #[arg(long)]
    pub repeat: Option<String>,

    /// Recurrence interval, in units of `--repeat`.
    #[arg(long, default_value_t = 1, requires = "repeat")]
    pub every: u32,

    /// Goal to link (ID or unique prefix).
    #[arg(long)]
    pub goal: Option<String>,

    /// Milestone to link (ID or unique prefix).
    #[arg(long)]
    pub milestone: Option<String>,
}

pub fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let today = session.planner.today();

    let priority = args
        .priority
        .as_deref()
        .map(parse_enum::<Priority>)
        .transpose()?;
    let recurrence = match args.repeat.as_deref() {
        Some(raw) => Some(Recurrence::new(
            parse_enum::<RecurrenceKind>(raw)?,
            require_positive(args.every, "--every")?,
        )),
        None => None,
    };
    let goal_id = args
        .goal
        .as_deref()
        .map(|raw| session.resolve_goal(raw))
        .transpose()?;
    let milestone_id = args
        .milestone
        .as_deref()
        .map(|raw| session.resolve_milestone(raw))
        .transpose()?;
    // A milestone implies its goal.
    let goal_id = goal_id.or_else(|| {
        milestone_id
            .as_deref()
            .and_then(|id| session.planner.goals().milestone(id))
            .map(|m| m.goal_id.clone())
    });

    let fields = NewTask {
        title: args.title.clone(),
        description: args.description.clone(),
        priority,
        due_date: args.due.as_deref().map(|d| parse_date(d, today)).transpose()?,
        due_time: args.due_time.as_deref().map(parse_time).transpose()?,
        estimated_minutes: args.estimate,
        tags: args.tags.clone(),
        subtasks: args.subtasks.clone(),
        recurrence,
        goal_id,
        milestone_id,
    };

    let task = session.planner.engine_mut().add_task(fields)?;
    session.save()?;

    render_outcome(
        output,
        &format!("Added {} {}", task.id, task.title),
        serde_json::to_value(&task)?,
        &[],
    )
}
