//! `cad mit`: pick, drop and review today's most important tasks.

use anyhow::Result;
use cadence_core::model::task::Task;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::{render_outcome, write_task_line};
use crate::output::{OutputMode, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct MitArgs {
    #[command(subcommand)]
    pub command: MitCommand,
}

#[derive(Subcommand, Debug)]
pub enum MitCommand {
    /// Flag a task as one of today's MITs (up to the daily cap).
    Set {
        /// Task ID or unique prefix.
        id: String,
    },
    /// Drop the MIT flag from a task.
    Unset {
        /// Task ID or unique prefix.
        id: String,
    },
    /// Show today's MITs.
    List,
    /// Clear MIT flags left over from earlier days.
    Sweep,
}

#[derive(Debug, Serialize)]
struct MitView<'a> {
    #[serde(skip)]
    today: chrono::NaiveDate,
    cap: usize,
    tasks: Vec<&'a Task>,
}

pub fn run_mit(args: &MitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    match &args.command {
        MitCommand::Set { id } => {
            let id = session.resolve_task(id)?;
            session.planner.select_mit(&id)?;
            session.save()?;
            render_outcome(output, &format!("{id} is a MIT today"), serde_json::Value::Null, &[])
        }
        MitCommand::Unset { id } => {
            let id = session.resolve_task(id)?;
            session.planner.engine_mut().set_mit(&id, false)?;
            session.save()?;
            render_outcome(output, &format!("{id} is no longer a MIT"), serde_json::Value::Null, &[])
        }
        MitCommand::Sweep => {
            // Opening the session already ran and saved the sweep.
            let cleared = session.day.expired_mits;
            render_outcome(
                output,
                &format!("Cleared {cleared} expired MIT flag(s)"),
                serde_json::json!({ "cleared": cleared }),
                &[],
            )
        }
        MitCommand::List => {
            let view = MitView {
                today: session.planner.today(),
                cap: session.planner.config().mit.daily_cap,
                tasks: session.planner.engine().today_mits(),
            };
            render_mode(
                output,
                &view,
                |view, w| {
                    for task in &view.tasks {
                        write_task_line(w, task, view.today)?;
                    }
                    Ok(())
                },
                |view, w| {
                    pretty_section(w, &format!("Today's MITs ({}/{})", view.tasks.len(), view.cap))?;
                    if view.tasks.is_empty() {
                        writeln!(w, "None picked yet. Use `cad mit set <id>`.")?;
                    }
                    for task in &view.tasks {
                        write_task_line(w, task, view.today)?;
                    }
                    Ok(())
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: MitArgs,
    }

    #[test]
    fn mit_subcommands_parse() {
        let w = Wrapper::parse_from(["test", "set", "t-1"]);
        assert!(matches!(w.args.command, MitCommand::Set { ref id } if id == "t-1"));
        let w = Wrapper::parse_from(["test", "sweep"]);
        assert!(matches!(w.args.command, MitCommand::Sweep));
    }
}
