//! `cad show`: full detail for one task.

use anyhow::Result;
use cadence_core::model::task::Task;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::output::{OutputMode, pretty_kv, pretty_rule, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Task ID or unique prefix.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct TaskDetail<'a> {
    #[serde(flatten)]
    task: &'a Task,
    goal_title: Option<&'a str>,
    milestone_title: Option<&'a str>,
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let goals = session.planner.goals();
    let Some(task) = session.planner.engine().task(&id) else {
        anyhow::bail!("task {id} vanished while loading");
    };

    let detail = TaskDetail {
        task,
        goal_title: task
            .goal_id
            .as_deref()
            .and_then(|g| goals.goal(g))
            .map(|g| g.title.as_str()),
        milestone_title: task
            .milestone_id
            .as_deref()
            .and_then(|m| goals.milestone(m))
            .map(|m| m.title.as_str()),
    };
    render_mode(output, &detail, write_text, |detail, w| {
        writeln!(w, "{}", detail.task.title)?;
        pretty_rule(w)?;
        write_text(detail, w)
    })
}

fn write_text(detail: &TaskDetail<'_>, w: &mut dyn Write) -> io::Result<()> {
    let task = detail.task;
    pretty_kv(w, "ID", &task.id)?;
    pretty_kv(w, "Title", &task.title)?;
    pretty_kv(w, "Stage", task.stage.to_string())?;
    pretty_kv(w, "Priority", task.priority.to_string())?;
    if let Some(quadrant) = task.quadrant {
        pretty_kv(w, "Quadrant", quadrant.to_string())?;
    }
    if let Some(description) = task.description.as_deref() {
        pretty_kv(w, "Notes", description)?;
    }
    if let Some(due) = task.due_date {
        let time = task
            .due_time
            .map(|t| format!(" {}", t.format("%H:%M")))
            .unwrap_or_default();
        pretty_kv(w, "Due", format!("{due}{time}"))?;
    }
    if let Some(day) = task.scheduled_for {
        let time = task
            .scheduled_time
            .map(|t| format!(" {}", t.format("%H:%M")))
            .unwrap_or_default();
        pretty_kv(w, "Scheduled", format!("{day}{time}"))?;
    }
    if let Some(minutes) = task.estimated_minutes {
        pretty_kv(w, "Estimate", format!("{minutes}m"))?;
    }
    if let Some(minutes) = task.actual_minutes {
        pretty_kv(w, "Actual", format!("{minutes}m"))?;
    }
    if let Some(recurrence) = task.recurrence {
        pretty_kv(
            w,
            "Repeats",
            format!("{} (every {})", recurrence.kind, recurrence.interval),
        )?;
    }
    if task.is_mit {
        let day = task.mit_date.map(|d| d.to_string()).unwrap_or_default();
        pretty_kv(w, "MIT", day)?;
    }
    if !task.tags.is_empty() {
        pretty_kv(w, "Tags", task.tags.join(", "))?;
    }
    if let Some(goal) = detail.goal_title {
        pretty_kv(w, "Goal", goal)?;
    }
    if let Some(milestone) = detail.milestone_title {
        pretty_kv(w, "Milestone", milestone)?;
    }
    if let Some(at) = task.completed_at {
        pretty_kv(w, "Completed", at.to_rfc3339())?;
    }
    if !task.subtasks.is_empty() {
        let (done, total) = task.subtask_progress();
        writeln!(w, "Subtasks ({done}/{total}):")?;
        for subtask in &task.subtasks {
            let mark = if subtask.completed { "x" } else { " " };
            writeln!(w, "  [{mark}] {} {}", subtask.id, subtask.title)?;
        }
    }
    Ok(())
}
