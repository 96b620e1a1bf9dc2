//! `cad goal`, `cad milestone` and `cad areas`.

use anyhow::Result;
use cadence_core::goals::{AreaStats, goal_quadrant, goals_by_quadrant};
use cadence_core::model::goal::{
    Goal, GoalPatch, GoalPriority, GoalStatus, LifeArea, Milestone, MilestonePatch, NewGoal,
    NewMilestone, Timeframe,
};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::{parse_date, parse_enum, render_outcome};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render, render_mode};
use crate::session::Session;

// ---------------------------------------------------------------------------
// goal
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct GoalArgs {
    #[command(subcommand)]
    pub command: GoalCommand,
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    /// Create a goal.
    Add(GoalAddArgs),
    /// List goals.
    List(GoalListArgs),
    /// Edit goal fields.
    Edit(GoalEditArgs),
    /// Show a goal with its milestones.
    Show {
        /// Goal ID or unique prefix.
        id: String,
    },
    /// Mark a goal completed.
    Complete {
        /// Goal ID or unique prefix.
        id: String,
    },
    /// Pause a goal.
    Pause {
        /// Goal ID or unique prefix.
        id: String,
    },
    /// Make a paused or completed goal active again.
    Resume {
        /// Goal ID or unique prefix.
        id: String,
    },
    /// Delete a goal and its milestones; linked tasks are kept but unlinked.
    Delete {
        /// Goal ID or unique prefix.
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct GoalAddArgs {
    /// Goal title.
    pub title: String,

    /// Life area: health, career, relationships, finance, growth or fun.
    #[arg(long, default_value = "career")]
    pub area: String,

    /// Horizon: short, medium or long.
    #[arg(long, default_value = "medium")]
    pub timeframe: String,

    /// Target date (YYYY-MM-DD, today, tomorrow or +N).
    #[arg(long)]
    pub deadline: Option<String>,

    /// Longer description.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Why this goal matters.
    #[arg(long, default_value = "")]
    pub why: String,

    /// Who you become by reaching it.
    #[arg(long, default_value = "")]
    pub identity: String,

    /// Impact, 1-5.
    #[arg(long, default_value_t = 3)]
    pub impact: u8,

    /// Effort, 1-5.
    #[arg(long, default_value_t = 3)]
    pub effort: u8,
}

#[derive(Args, Debug)]
pub struct GoalEditArgs {
    /// Goal ID or unique prefix.
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub why: Option<String>,

    #[arg(long)]
    pub identity: Option<String>,

    #[arg(long)]
    pub area: Option<String>,

    #[arg(long)]
    pub timeframe: Option<String>,

    /// New target date.
    #[arg(long, conflicts_with = "no_deadline")]
    pub deadline: Option<String>,

    /// Clear the target date.
    #[arg(long)]
    pub no_deadline: bool,

    /// Impact, 1-5 (effort is kept unless also given).
    #[arg(long)]
    pub impact: Option<u8>,

    /// Effort, 1-5 (impact is kept unless also given).
    #[arg(long)]
    pub effort: Option<u8>,
}

#[derive(Args, Debug)]
pub struct GoalListArgs {
    /// Only goals in this life area.
    #[arg(long)]
    pub area: Option<String>,

    /// Only goals with this status: active, completed or paused.
    #[arg(long)]
    pub status: Option<String>,

    /// Group by impact/effort cell.
    #[arg(long)]
    pub by_quadrant: bool,
}

#[derive(Debug, Serialize)]
struct GoalRow<'a> {
    #[serde(flatten)]
    goal: &'a Goal,
    progress: u8,
    quadrant: &'static str,
}

#[derive(Debug, Serialize)]
struct MilestoneRow<'a> {
    #[serde(flatten)]
    milestone: &'a Milestone,
    tasks: usize,
    tasks_done: usize,
}

#[derive(Debug, Serialize)]
struct GoalDetail<'a> {
    #[serde(flatten)]
    row: GoalRow<'a>,
    milestones: Vec<MilestoneRow<'a>>,
}

pub fn run_goal(args: &GoalArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    match &args.command {
        GoalCommand::Add(add) => {
            let today = session.planner.today();
            let fields = NewGoal {
                title: add.title.clone(),
                description: add.description.clone(),
                why: add.why.clone(),
                identity: add.identity.clone(),
                area: parse_enum::<LifeArea>(&add.area)?,
                deadline: add
                    .deadline
                    .as_deref()
                    .map(|d| parse_date(d, today))
                    .transpose()?,
                timeframe: parse_enum::<Timeframe>(&add.timeframe)?,
                priority: GoalPriority {
                    impact: add.impact,
                    effort: add.effort,
                },
                ..NewGoal::default()
            };
            let goal = session.planner.add_goal(fields)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Added goal {} {}", goal.id, goal.title),
                serde_json::to_value(&goal)?,
                &[],
            )
        }
        GoalCommand::List(list) => run_goal_list(list, output, &session),
        GoalCommand::Edit(edit) => {
            let id = session.resolve_goal(&edit.id)?;
            let patch = build_goal_patch(edit, &session, &id)?;
            let goal = session
                .planner
                .engine_mut()
                .milestones_mut()
                .update_goal(&id, patch)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Updated goal {}", goal.id),
                serde_json::to_value(&goal)?,
                &[],
            )
        }
        GoalCommand::Show { id } => {
            let id = session.resolve_goal(id)?;
            run_goal_show(&id, output, &session)
        }
        GoalCommand::Complete { id } => {
            let id = session.resolve_goal(id)?;
            session.planner.complete_goal(&id)?;
            session.save()?;
            render_outcome(output, &format!("Completed goal {id}"), serde_json::Value::Null, &[])
        }
        GoalCommand::Pause { id } => {
            let id = session.resolve_goal(id)?;
            session.planner.engine_mut().milestones_mut().pause_goal(&id)?;
            session.save()?;
            render_outcome(output, &format!("Paused goal {id}"), serde_json::Value::Null, &[])
        }
        GoalCommand::Resume { id } => {
            let id = session.resolve_goal(id)?;
            session.planner.engine_mut().milestones_mut().resume_goal(&id)?;
            session.save()?;
            render_outcome(output, &format!("Resumed goal {id}"), serde_json::Value::Null, &[])
        }
        GoalCommand::Delete { id } => {
            let id = session.resolve_goal(id)?;
            let unlinked = session.planner.delete_goal(&id)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Deleted goal {id}; unlinked {unlinked} task(s)"),
                serde_json::json!({ "unlinked": unlinked }),
                &[],
            )
        }
    }
}

fn build_goal_patch(args: &GoalEditArgs, session: &Session, id: &str) -> Result<GoalPatch> {
    let today = session.planner.today();
    let deadline = if args.no_deadline {
        Some(None)
    } else {
        args.deadline
            .as_deref()
            .map(|d| parse_date(d, today).map(Some))
            .transpose()?
    };
    let priority = if args.impact.is_some() || args.effort.is_some() {
        let current = session
            .planner
            .goals()
            .goal(id)
            .map(|g| g.priority)
            .unwrap_or_default();
        Some(GoalPriority {
            impact: args.impact.unwrap_or(current.impact),
            effort: args.effort.unwrap_or(current.effort),
        })
    } else {
        None
    };
    Ok(GoalPatch {
        title: args.title.clone(),
        description: args.description.clone(),
        why: args.why.clone(),
        identity: args.identity.clone(),
        area: args.area.as_deref().map(parse_enum::<LifeArea>).transpose()?,
        deadline,
        timeframe: args
            .timeframe
            .as_deref()
            .map(parse_enum::<Timeframe>)
            .transpose()?,
        smart: None,
        priority,
    })
}

fn goal_row<'a>(session: &'a Session, goal: &'a Goal) -> GoalRow<'a> {
    GoalRow {
        goal,
        progress: session.planner.goal_progress(&goal.id),
        quadrant: goal_quadrant(goal).as_str(),
    }
}

fn write_goal_line(w: &mut dyn Write, row: &GoalRow<'_>) -> io::Result<()> {
    writeln!(
        w,
        "{:<12} {:>3}%  {:<13} {:<9} {}",
        row.goal.id, row.progress, row.goal.area, row.goal.status, row.goal.title
    )
}

fn run_goal_list(args: &GoalListArgs, output: OutputMode, session: &Session) -> Result<()> {
    let area = args.area.as_deref().map(parse_enum::<LifeArea>).transpose()?;
    let status = args.status.as_deref().map(parse_enum::<GoalStatus>).transpose()?;
    let goals: Vec<Goal> = session
        .planner
        .goals()
        .goals()
        .iter()
        .filter(|g| area.is_none_or(|a| g.area == a))
        .filter(|g| status.is_none_or(|s| g.status == s))
        .cloned()
        .collect();

    if args.by_quadrant {
        let grouped = goals_by_quadrant(&goals);
        return render(output, &grouped, |grouped, w| {
            for (quadrant, goals) in grouped {
                writeln!(w, "{quadrant} ({})", goals.len())?;
                for goal in goals {
                    writeln!(w, "  {:<12} {}", goal.id, goal.title)?;
                }
            }
            Ok(())
        });
    }

    let rows: Vec<GoalRow<'_>> = goals.iter().map(|g| goal_row(session, g)).collect();
    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                write_goal_line(w, row)?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("Goals ({})", rows.len()))?;
            if rows.is_empty() {
                writeln!(w, "No goals yet. Use `cad goal add <title>`.")?;
            }
            for row in rows {
                write_goal_line(w, row)?;
            }
            Ok(())
        },
    )
}

fn run_goal_show(id: &str, output: OutputMode, session: &Session) -> Result<()> {
    let board = session.planner.goals();
    let Some(goal) = board.goal(id) else {
        anyhow::bail!("goal {id} vanished while loading");
    };
    let engine = session.planner.engine();
    let milestones = board
        .milestones_for(id)
        .into_iter()
        .map(|milestone| {
            let linked = engine.tasks_for_milestone(&milestone.id);
            MilestoneRow {
                milestone,
                tasks: linked.len(),
                tasks_done: linked.iter().filter(|t| t.completed).count(),
            }
        })
        .collect();
    let detail = GoalDetail {
        row: goal_row(session, goal),
        milestones,
    };

    render_mode(output, &detail, write_goal_detail, |detail, w| {
        writeln!(w, "{}", detail.row.goal.title)?;
        pretty_rule(w)?;
        write_goal_detail(detail, w)
    })
}

fn write_goal_detail(detail: &GoalDetail<'_>, w: &mut dyn Write) -> io::Result<()> {
    let goal = detail.row.goal;
    pretty_kv(w, "ID", &goal.id)?;
    pretty_kv(w, "Area", goal.area.to_string())?;
    pretty_kv(w, "Status", goal.status.to_string())?;
    pretty_kv(w, "Timeframe", goal.timeframe.to_string())?;
    pretty_kv(w, "Progress", format!("{}%", detail.row.progress))?;
    pretty_kv(
        w,
        "Priority",
        format!(
            "impact {} / effort {} ({})",
            goal.priority.impact, goal.priority.effort, detail.row.quadrant
        ),
    )?;
    if let Some(deadline) = goal.deadline {
        pretty_kv(w, "Deadline", deadline.to_string())?;
    }
    if !goal.why.is_empty() {
        pretty_kv(w, "Why", &goal.why)?;
    }
    if !goal.identity.is_empty() {
        pretty_kv(w, "Identity", &goal.identity)?;
    }
    if detail.milestones.is_empty() {
        writeln!(w, "No milestones.")?;
    } else {
        writeln!(w, "Milestones:")?;
        for row in &detail.milestones {
            let m = row.milestone;
            writeln!(
                w,
                "  {:<12} {:>3}%  {:<9} {} ({}/{} tasks)",
                m.id, m.progress, m.status, m.title, row.tasks_done, row.tasks
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// milestone
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct MilestoneArgs {
    #[command(subcommand)]
    pub command: MilestoneCommand,
}

#[derive(Subcommand, Debug)]
pub enum MilestoneCommand {
    /// Add a milestone to a goal.
    Add {
        /// Goal ID or unique prefix.
        goal: String,
        /// Milestone title.
        title: String,
        /// Target date (YYYY-MM-DD, today, tomorrow or +N).
        #[arg(long)]
        deadline: Option<String>,
        /// Numeric target, e.g. 42 for "run 42 km".
        #[arg(long)]
        target: Option<f64>,
        /// Unit of the target.
        #[arg(long, requires = "target")]
        unit: Option<String>,
    },
    /// Edit a milestone, including its measured value.
    Edit {
        /// Milestone ID or unique prefix.
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// New target date.
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        target: Option<f64>,
        /// Current measured value toward the target.
        #[arg(long)]
        current: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Mark a milestone completed.
    Complete {
        /// Milestone ID or unique prefix.
        id: String,
    },
    /// Delete a milestone; linked tasks are kept but unlinked.
    Delete {
        /// Milestone ID or unique prefix.
        id: String,
    },
}

pub fn run_milestone(args: &MilestoneArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    match &args.command {
        MilestoneCommand::Add {
            goal,
            title,
            deadline,
            target,
            unit,
        } => {
            let goal_id = session.resolve_goal(goal)?;
            let today = session.planner.today();
            let fields = NewMilestone {
                goal_id,
                title: title.clone(),
                deadline: deadline
                    .as_deref()
                    .map(|d| parse_date(d, today))
                    .transpose()?,
                target_value: *target,
                unit: unit.clone(),
            };
            let milestone = session.planner.add_milestone(fields)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Added milestone {} {}", milestone.id, milestone.title),
                serde_json::to_value(&milestone)?,
                &[],
            )
        }
        MilestoneCommand::Edit {
            id,
            title,
            deadline,
            target,
            current,
            unit,
        } => {
            let id = session.resolve_milestone(id)?;
            let today = session.planner.today();
            let patch = MilestonePatch {
                title: title.clone(),
                deadline: deadline
                    .as_deref()
                    .map(|d| parse_date(d, today).map(Some))
                    .transpose()?,
                target_value: target.map(Some),
                current_value: current.map(Some),
                unit: unit.clone().map(Some),
            };
            let milestone = session
                .planner
                .engine_mut()
                .milestones_mut()
                .update_milestone(&id, patch)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Updated milestone {}", milestone.id),
                serde_json::to_value(&milestone)?,
                &[],
            )
        }
        MilestoneCommand::Complete { id } => {
            let id = session.resolve_milestone(id)?;
            session
                .planner
                .engine_mut()
                .milestones_mut()
                .complete_milestone(&id)?;
            session.save()?;
            render_outcome(output, &format!("Completed milestone {id}"), serde_json::Value::Null, &[])
        }
        MilestoneCommand::Delete { id } => {
            let id = session.resolve_milestone(id)?;
            let unlinked = session.planner.delete_milestone(&id)?;
            session.save()?;
            render_outcome(
                output,
                &format!("Deleted milestone {id}; unlinked {unlinked} task(s)"),
                serde_json::json!({ "unlinked": unlinked }),
                &[],
            )
        }
    }
}

// ---------------------------------------------------------------------------
// areas
// ---------------------------------------------------------------------------

pub fn run_areas(output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let stats: Vec<AreaStats> = session.planner.area_stats();
    render_mode(
        output,
        &stats,
        |stats, w| {
            for s in stats {
                write_area_line(w, s)?;
            }
            Ok(())
        },
        |stats, w| {
            pretty_section(w, "Life areas")?;
            for s in stats {
                write_area_line(w, s)?;
            }
            Ok(())
        },
    )
}

fn write_area_line(w: &mut dyn Write, stats: &AreaStats) -> io::Result<()> {
    writeln!(
        w,
        "{:<14} {:>3}%  {} active / {} total",
        stats.area, stats.average_progress, stats.active_goals, stats.total_goals
    )
}
