//! `cad subtask`: checklist items on a task.

use anyhow::Result;
use cadence_core::EngineError;
use clap::{Args, Subcommand};
use std::path::Path;

use super::render_outcome;
use crate::output::OutputMode;
use crate::session::{Session, resolve_id};

#[derive(Args, Debug)]
pub struct SubtaskArgs {
    #[command(subcommand)]
    pub command: SubtaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubtaskCommand {
    /// Append a subtask.
    Add {
        /// Task ID or unique prefix.
        task: String,
        /// Subtask title.
        title: String,
    },
    /// Flip a subtask between open and done.
    Toggle {
        /// Task ID or unique prefix.
        task: String,
        /// Subtask ID or unique prefix.
        subtask: String,
    },
    /// Remove a subtask.
    Rm {
        /// Task ID or unique prefix.
        task: String,
        /// Subtask ID or unique prefix.
        subtask: String,
    },
}

pub fn run_subtask(args: &SubtaskArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let (task_id, message) = match &args.command {
        SubtaskCommand::Add { task, title } => {
            let task_id = session.resolve_task(task)?;
            let subtask = session.planner.engine_mut().add_subtask(&task_id, title)?;
            let message = format!("Added subtask {} to {task_id}", subtask.id);
            (task_id, message)
        }
        SubtaskCommand::Toggle { task, subtask } => {
            let task_id = session.resolve_task(task)?;
            let subtask_id = resolve_subtask(&session, &task_id, subtask)?;
            let done = session
                .planner
                .engine_mut()
                .toggle_subtask(&task_id, &subtask_id)?;
            let state = if done { "done" } else { "open" };
            (task_id, format!("Subtask {subtask_id} is {state}"))
        }
        SubtaskCommand::Rm { task, subtask } => {
            let task_id = session.resolve_task(task)?;
            let subtask_id = resolve_subtask(&session, &task_id, subtask)?;
            let removed = session
                .planner
                .engine_mut()
                .delete_subtask(&task_id, &subtask_id)?;
            let message = format!("Removed subtask {} {}", removed.id, removed.title);
            (task_id, message)
        }
    };
    session.save()?;

    let payload = session
        .planner
        .engine()
        .task(&task_id)
        .map(serde_json::to_value)
        .transpose()?
        .unwrap_or_default();
    render_outcome(output, &message, payload, &[])
}

fn resolve_subtask(session: &Session, task_id: &str, raw: &str) -> Result<String, EngineError> {
    let subtasks = session
        .planner
        .engine()
        .task(task_id)
        .map(|t| t.subtasks.as_slice())
        .unwrap_or_default();
    resolve_id(raw, subtasks.iter().map(|s| s.id.as_str())).ok_or_else(|| {
        EngineError::SubtaskNotFound {
            task_id: task_id.to_string(),
            subtask_id: raw.to_string(),
        }
    })
}
