//! Gamification commands: `stats`, `focus`, `challenges` and `achievements`.

use anyhow::Result;
use cadence_core::gamify::achievements::CATALOG;
use cadence_core::gamify::{Challenge, DayStats, LevelInfo};
use cadence_core::model::task::Stage;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use super::render_outcome;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Zero XP, streaks, history, achievements and challenges.
    #[arg(long)]
    pub reset: bool,
}

#[derive(Args, Debug)]
pub struct FocusArgs {
    /// Minutes of focused work to log.
    pub minutes: u32,
}

#[derive(Debug, Serialize)]
struct DayRow {
    date: NaiveDate,
    #[serde(flatten)]
    stats: DayStats,
}

#[derive(Debug, Serialize)]
struct StatsView {
    level: LevelInfo,
    total_xp: u64,
    current_streak: u32,
    longest_streak: u32,
    total_tasks_completed: u64,
    completed_today: u32,
    focus_seconds_today: u64,
    stages: BTreeMap<Stage, usize>,
    week: Vec<DayRow>,
    achievements: usize,
}

pub fn run_stats(args: &StatsArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    if args.reset {
        session.planner.gamification_mut().reset();
        session.save()?;
        return render_outcome(output, "Stats reset", serde_json::Value::Null, &[]);
    }

    let today = session.planner.today();
    let stats = session.planner.gamification().stats();
    let view = StatsView {
        level: session.planner.level_info(),
        total_xp: stats.total_xp,
        current_streak: stats.effective_streak(today),
        longest_streak: stats.longest_streak,
        total_tasks_completed: stats.total_tasks_completed,
        completed_today: stats.tasks_completed_today(today),
        focus_seconds_today: stats.focus_time_today(today),
        stages: session.planner.engine().stage_counts(),
        week: stats
            .week_summary(today)
            .into_iter()
            .map(|(date, stats)| DayRow { date, stats })
            .collect(),
        achievements: stats.achievements.len(),
    };
    render_mode(output, &view, write_stats_text, |view, w| {
        pretty_section(w, "Progress")?;
        write_stats_text(view, w)?;
        writeln!(w)?;
        pretty_section(w, "Last 7 days")?;
        for day in &view.week {
            let bar = "#".repeat(usize::try_from(day.stats.completed).unwrap_or(usize::MAX).min(40));
            writeln!(
                w,
                "{} {:>3} {:<40} {}m focus",
                day.date.format("%a %d"),
                day.stats.completed,
                bar,
                day.stats.focus_time / 60
            )?;
        }
        Ok(())
    })
}

fn write_stats_text(view: &StatsView, w: &mut dyn Write) -> io::Result<()> {
    let level = &view.level;
    let next = level
        .next_threshold
        .map_or_else(|| "max".to_string(), |n| n.to_string());
    pretty_kv(w, "Level", format!("{} {}", level.level, level.title))?;
    pretty_kv(w, "XP", format!("{} (next at {next})", view.total_xp))?;
    pretty_kv(
        w,
        "Streak",
        format!("{} (best {})", view.current_streak, view.longest_streak),
    )?;
    pretty_kv(
        w,
        "Completed",
        format!("{} today, {} total", view.completed_today, view.total_tasks_completed),
    )?;
    pretty_kv(w, "Focus", format!("{}m today", view.focus_seconds_today / 60))?;
    pretty_kv(
        w,
        "Achievements",
        format!("{}/{}", view.achievements, CATALOG.len()),
    )?;
    let stages = view
        .stages
        .iter()
        .map(|(stage, count)| format!("{stage} {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    pretty_kv(w, "Stages", stages)
}

pub fn run_focus(args: &FocusArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    if args.minutes == 0 {
        anyhow::bail!("focus time must be at least 1 minute");
    }
    let mut session = Session::open(project_root)?;
    session.planner.add_focus_time(u64::from(args.minutes) * 60);
    session.save()?;
    let rewards = session.drain_rewards();
    let today = session.planner.today();
    let total = session.planner.gamification().stats().focus_time_today(today);
    render_outcome(
        output,
        &format!("Logged {}m of focus ({}m today)", args.minutes, total / 60),
        serde_json::json!({ "focus_seconds_today": total }),
        &rewards,
    )
}

pub fn run_challenges(output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let challenges: Vec<Challenge> = session.planner.challenge_status().to_vec();
    render_mode(
        output,
        &challenges,
        |challenges, w| {
            for c in challenges {
                write_challenge_line(w, c)?;
            }
            Ok(())
        },
        |challenges, w| {
            pretty_section(w, "This week's challenges")?;
            if challenges.is_empty() {
                writeln!(w, "No challenges this week.")?;
            }
            for c in challenges {
                write_challenge_line(w, c)?;
            }
            Ok(())
        },
    )
}

fn write_challenge_line(w: &mut dyn Write, c: &Challenge) -> io::Result<()> {
    let mark = if c.completed { "✓" } else { " " };
    writeln!(
        w,
        "[{mark}] {:<8} {} {}/{} (+{} XP)",
        c.difficulty, c.title, c.progress, c.target, c.xp
    )
}

#[derive(Debug, Serialize)]
struct AchievementRow {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    xp: u64,
    unlocked: bool,
}

pub fn run_achievements(output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let unlocked = &session.planner.gamification().stats().achievements;
    let rows: Vec<AchievementRow> = CATALOG
        .iter()
        .map(|a| AchievementRow {
            id: a.id,
            name: a.name,
            description: a.description,
            xp: a.xp,
            unlocked: unlocked.contains(a.id),
        })
        .collect();
    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows.iter().filter(|r| r.unlocked) {
                writeln!(w, "{} {}", row.id, row.name)?;
            }
            Ok(())
        },
        |rows, w| {
            let count = rows.iter().filter(|r| r.unlocked).count();
            pretty_section(w, &format!("Achievements ({count}/{})", rows.len()))?;
            for row in rows {
                let mark = if row.unlocked { "✓" } else { " " };
                writeln!(w, "[{mark}] {:<18} {} (+{} XP)", row.name, row.description, row.xp)?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::gamify::Difficulty;
    use cadence_core::gamify::challenges::ChallengeKind;

    #[test]
    fn focus_args_parse_minutes() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: FocusArgs,
        }
        let w = Wrapper::parse_from(["test", "25"]);
        assert_eq!(w.args.minutes, 25);
        assert!(Wrapper::try_parse_from(["test", "-5"]).is_err());
    }

    #[test]
    fn challenge_line_shows_progress() {
        let challenge = Challenge {
            id: "complete_10".into(),
            title: "Complete 10 tasks".into(),
            kind: ChallengeKind::TasksCompleted,
            difficulty: Difficulty::Easy,
            target: 10,
            progress: 4,
            completed: false,
            xp: 50,
        };
        let mut buf = Vec::new();
        write_challenge_line(&mut buf, &challenge).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[ ] easy     Complete 10 tasks 4/10 (+50 XP)\n"
        );
    }
}
