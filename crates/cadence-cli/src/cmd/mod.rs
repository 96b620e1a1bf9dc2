pub mod add;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod export;
pub mod goal;
pub mod import;
pub mod init;
pub mod list;
pub mod mit;
pub mod show;
pub mod stage;
pub mod stats;
pub mod subtask;

use anyhow::{Context, bail};
use cadence_core::gamify::Reward;
use cadence_core::model::parse_time_of_day;
use cadence_core::model::task::{Stage, Task};
use chrono::{Days, NaiveDate, NaiveTime};
use std::io::{self, Write};

use crate::output::OutputMode;

/// Parse a user-supplied date: `today`, `tomorrow`, `+N` days, or
/// `YYYY-MM-DD`.
pub fn parse_date(raw: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let text = raw.trim().to_ascii_lowercase();
    match text.as_str() {
        "today" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .context("date out of range");
        }
        _ => {}
    }
    if let Some(offset) = text.strip_prefix('+') {
        let days: u64 = offset
            .parse()
            .with_context(|| format!("invalid day offset '{raw}'"))?;
        return today
            .checked_add_days(Days::new(days))
            .context("date out of range");
    }
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}' (use YYYY-MM-DD, today, tomorrow or +N)"))
}

pub fn parse_time(raw: &str) -> anyhow::Result<NaiveTime> {
    parse_time_of_day(raw.trim()).with_context(|| format!("invalid time '{raw}' (use HH:MM)"))
}

/// Parse an enum-valued flag through its `FromStr`.
pub fn parse_enum<T>(raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(raw.parse::<T>()?)
}

pub fn require_positive(value: u32, what: &str) -> anyhow::Result<u32> {
    if value == 0 {
        bail!("{what} must be at least 1");
    }
    Ok(value)
}

fn stage_marker(stage: Stage) -> &'static str {
    match stage {
        Stage::Inbox => "·",
        Stage::Prioritized => "!",
        Stage::Scheduled => "@",
        Stage::InProgress => "▶",
        Stage::Done => "✓",
        Stage::Someday => "~",
    }
}

/// One-line task summary shared by list-style commands.
pub fn write_task_line(w: &mut dyn Write, task: &Task, today: NaiveDate) -> io::Result<()> {
    let mut extras = Vec::new();
    if task.is_mit_on(today) {
        extras.push("MIT".to_string());
    }
    if let Some(due) = task.due_date {
        if !task.completed && due < today {
            extras.push(format!("overdue {due}"));
        } else {
            extras.push(format!("due {due}"));
        }
    }
    if let Some(day) = task.scheduled_for {
        extras.push(format!("on {day}"));
    }
    let (done, total) = task.subtask_progress();
    if total > 0 {
        extras.push(format!("{done}/{total}"));
    }
    if !task.tags.is_empty() {
        extras.push(task.tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" "));
    }
    let suffix = if extras.is_empty() {
        String::new()
    } else {
        format!("  [{}]", extras.join(", "))
    };
    writeln!(
        w,
        "{} {:<12} {:<6} {}{}",
        stage_marker(task.stage),
        task.id,
        task.priority,
        task.title,
        suffix
    )
}

/// Report rewards earned by a mutation. JSON callers embed them instead.
pub fn write_rewards(w: &mut dyn Write, rewards: &[Reward]) -> io::Result<()> {
    for reward in rewards {
        match reward {
            Reward::Xp { amount } => writeln!(w, "  +{amount} XP")?,
            Reward::AchievementUnlocked { name, xp, .. } => {
                writeln!(w, "  achievement unlocked: {name} (+{xp} XP)")?;
            }
            Reward::ChallengeCompleted { title, xp, .. } => {
                writeln!(w, "  challenge completed: {title} (+{xp} XP)")?;
            }
            Reward::LevelUp { level, title } => writeln!(w, "  level up: {level} {title}")?,
        }
    }
    Ok(())
}

/// Success message followed by any rewards, or one JSON object carrying
/// both.
pub fn render_outcome(
    output: OutputMode,
    message: &str,
    payload: serde_json::Value,
    rewards: &[Reward],
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if output.is_json() {
        let mut body = serde_json::json!({ "ok": true, "message": message });
        if let serde_json::Value::Object(ref mut map) = body {
            if !payload.is_null() {
                map.insert("data".to_string(), payload);
            }
            map.insert("rewards".to_string(), serde_json::to_value(rewards)?);
        }
        serde_json::to_writer_pretty(&mut out, &body)?;
        writeln!(out)?;
    } else {
        writeln!(out, "✓ {message}")?;
        write_rewards(&mut out, rewards)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn relative_dates() {
        let today = date(2024, 2, 28);
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Tomorrow", today).unwrap(), date(2024, 2, 29));
        assert_eq!(parse_date("+3", today).unwrap(), date(2024, 3, 2));
    }

    #[test]
    fn absolute_and_invalid_dates() {
        let today = date(2024, 2, 28);
        assert_eq!(parse_date("2024-12-25", today).unwrap(), date(2024, 12, 25));
        assert!(parse_date("25/12/2024", today).is_err());
        assert!(parse_date("+x", today).is_err());
    }

    #[test]
    fn times_accept_minutes_and_seconds() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(parse_time("9.30").is_err());
    }

    #[test]
    fn task_line_flags_overdue_and_mit() {
        let today = date(2024, 2, 28);
        let task = Task {
            id: "t-1".into(),
            title: "file taxes".into(),
            due_date: Some(date(2024, 2, 1)),
            is_mit: true,
            mit_date: Some(today),
            tags: vec!["admin".into()],
            ..Task::default()
        };
        let mut buf = Vec::new();
        write_task_line(&mut buf, &task, today).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert!(line.contains("file taxes"));
        assert!(line.contains("MIT"));
        assert!(line.contains("overdue 2024-02-01"));
        assert!(line.contains("#admin"));
    }

    #[test]
    fn rewards_render_one_per_line() {
        let rewards = [
            Reward::Xp { amount: 30 },
            Reward::LevelUp {
                level: 2,
                title: "Apprentice",
            },
        ];
        let mut buf = Vec::new();
        write_rewards(&mut buf, &rewards).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "  +30 XP\n  level up: 2 Apprentice\n");
    }
}
