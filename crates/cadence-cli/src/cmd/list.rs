//! `cad list`: filtered views over the task collection.

use anyhow::Result;
use cadence_core::model::task::{Stage, Task};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::{parse_enum, write_task_line};
use crate::output::{OutputMode, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only tasks in this stage.
    #[arg(long, conflicts_with_all = ["today", "overdue", "mits"])]
    pub stage: Option<String>,

    /// Tasks scheduled for or due today.
    #[arg(long)]
    pub today: bool,

    /// Open tasks past their due date.
    #[arg(long)]
    pub overdue: bool,

    /// Today's most important tasks.
    #[arg(long)]
    pub mits: bool,

    /// Only tasks carrying this tag.
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Case-insensitive match on title, description and tags.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only tasks linked to this milestone.
    #[arg(long)]
    pub milestone: Option<String>,

    /// Include completed tasks.
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct ListView<'a> {
    #[serde(skip)]
    today: chrono::NaiveDate,
    count: usize,
    tasks: Vec<&'a Task>,
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let engine = session.planner.engine();
    let today = session.planner.today();

    let stage = args.stage.as_deref().map(parse_enum::<Stage>).transpose()?;
    let milestone = args
        .milestone
        .as_deref()
        .map(|raw| session.resolve_milestone(raw))
        .transpose()?;

    let mut tasks: Vec<&Task> = if args.today {
        engine.today_tasks()
    } else if args.overdue {
        engine.overdue_tasks()
    } else if args.mits {
        engine.today_mits()
    } else if let Some(stage) = stage {
        engine.by_stage(stage)
    } else if let Some(milestone) = milestone.as_deref() {
        engine.tasks_for_milestone(milestone)
    } else {
        engine.tasks().iter().collect()
    };

    if let Some(query) = args.search.as_deref() {
        let hits: Vec<&str> = engine.search(query).into_iter().map(|t| t.id.as_str()).collect();
        tasks.retain(|t| hits.contains(&t.id.as_str()));
    }
    if let Some(tag) = args.tag.as_deref() {
        tasks.retain(|t| t.has_tag(tag));
    }
    if let Some(milestone) = milestone.as_deref() {
        tasks.retain(|t| t.milestone_id.as_deref() == Some(milestone));
    }
    if !args.all && stage != Some(Stage::Done) {
        tasks.retain(|t| !t.completed);
    }

    let view = ListView {
        today,
        count: tasks.len(),
        tasks,
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
            let heading = match stage {
                Some(stage) => format!("Tasks in {stage} ({})", view.count),
                None => format!("Tasks ({})", view.count),
            };
            pretty_section(w, &heading)?;
            if view.tasks.is_empty() {
                writeln!(w, "Nothing here.")?;
            }
            for task in &view.tasks {
                write_task_line(w, task, view.today)?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ListArgs,
    }

    #[test]
    fn list_defaults() {
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.stage.is_none());
        assert!(!w.args.all);
        assert!(!w.args.today);
    }

    #[test]
    fn stage_conflicts_with_views() {
        assert!(Wrapper::try_parse_from(["test", "--stage", "inbox", "--today"]).is_err());
        let w = Wrapper::parse_from(["test", "--stage", "in-progress", "--tag", "work"]);
        assert_eq!(w.args.stage.as_deref(), Some("in-progress"));
        assert_eq!(w.args.tag.as_deref(), Some("work"));
    }
}
