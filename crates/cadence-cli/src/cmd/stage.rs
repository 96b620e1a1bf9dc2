//! Stage commands: `move`, `prioritize`, `schedule`, `start`, `done`,
//! `undone`, `reset`, `someday` and `activate`.
//!
//! `move` walks the transition table one hop at a time and rejects anything
//! else. The named commands are workflow shortcuts that set the target stage
//! directly.

use anyhow::Result;
use cadence_core::model::task::{Quadrant, Stage};
use clap::Args;
use std::path::Path;

use super::{parse_date, parse_enum, parse_time, render_outcome};
use crate::output::OutputMode;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Task ID or unique prefix.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// Target stage: inbox, prioritized, scheduled, in_progress, done or someday.
    pub stage: String,
}

#[derive(Args, Debug)]
pub struct PrioritizeArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// Eisenhower quadrant: do, schedule, delegate or eliminate.
    pub quadrant: String,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// Day to work on it (YYYY-MM-DD, today, tomorrow or +N).
    pub date: String,

    /// Time slot (HH:MM).
    #[arg(long = "at")]
    pub time: Option<String>,
}

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task ID or unique prefix.
    pub id: String,

    /// Minutes actually spent.
    #[arg(short, long)]
    pub minutes: Option<u32>,
}

/// Which shortcut an [`IdArgs`] command applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Start,
    Undone,
    Reset,
    Someday,
    Activate,
}

impl Shortcut {
    const fn verb(self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Undone => "Reopened",
            Self::Reset => "Reset",
            Self::Someday => "Parked",
            Self::Activate => "Activated",
        }
    }
}

pub fn run_move(args: &MoveArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let target: Stage = parse_enum(&args.stage)?;
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    session.planner.engine_mut().move_to_stage(&id, target)?;
    session.save()?;
    finish(&mut session, output, &id, &format!("Moved {id} to {target}"))
}

pub fn run_prioritize(args: &PrioritizeArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let quadrant: Quadrant = parse_enum(&args.quadrant)?;
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    session.planner.engine_mut().prioritize_task(&id, quadrant)?;
    session.save()?;
    finish(
        &mut session,
        output,
        &id,
        &format!("Prioritized {id} as {quadrant}"),
    )
}

pub fn run_schedule(args: &ScheduleArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let date = parse_date(&args.date, session.planner.today())?;
    let time = args.time.as_deref().map(parse_time).transpose()?;
    session.planner.engine_mut().schedule_task(&id, date, time)?;
    session.save()?;
    finish(&mut session, output, &id, &format!("Scheduled {id} for {date}"))
}

pub fn run_done(args: &DoneArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let before = session.planner.engine_mut().complete_task(&id, args.minutes)?;
    session.save()?;
    let message = if before.completed {
        format!("{id} was already done")
    } else {
        format!("Completed {id} {}", before.title)
    };
    finish(&mut session, output, &id, &message)
}

pub fn run_shortcut(
    shortcut: Shortcut,
    args: &IdArgs,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let engine = session.planner.engine_mut();
    match shortcut {
        Shortcut::Start => engine.start_task(&id)?,
        Shortcut::Undone => engine.uncomplete_task(&id)?,
        Shortcut::Reset => engine.reset_to_inbox(&id)?,
        Shortcut::Someday => engine.move_to_someday(&id)?,
        Shortcut::Activate => engine.activate_from_someday(&id)?,
    }
    session.save()?;
    finish(&mut session, output, &id, &format!("{} {id}", shortcut.verb()))
}

fn finish(session: &mut Session, output: OutputMode, id: &str, message: &str) -> Result<()> {
    let rewards = session.drain_rewards();
    let task = session
        .planner
        .engine()
        .task(id)
        .map(serde_json::to_value)
        .transpose()?
        .unwrap_or_default();
    render_outcome(output, message, task, &rewards)
}
