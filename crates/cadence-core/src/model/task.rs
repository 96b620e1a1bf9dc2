use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The six pipeline stages a task moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Inbox,
    Prioritized,
    Scheduled,
    InProgress,
    Done,
    Someday,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Inbox,
        Self::Prioritized,
        Self::Scheduled,
        Self::InProgress,
        Self::Done,
        Self::Someday,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Prioritized => "prioritized",
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Someday => "someday",
        }
    }

    /// Stages directly reachable from `self`.
    ///
    /// ```text
    /// inbox        -> prioritized, done, someday
    /// prioritized  -> scheduled, inbox, done, someday
    /// scheduled    -> in_progress, prioritized, done
    /// in_progress  -> done, scheduled
    /// done         -> inbox
    /// someday      -> inbox, prioritized
    /// ```
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Inbox => &[Self::Prioritized, Self::Done, Self::Someday],
            Self::Prioritized => &[Self::Scheduled, Self::Inbox, Self::Done, Self::Someday],
            Self::Scheduled => &[Self::InProgress, Self::Prioritized, Self::Done],
            Self::InProgress => &[Self::Done, Self::Scheduled],
            Self::Done => &[Self::Inbox],
            Self::Someday => &[Self::Inbox, Self::Prioritized],
        }
    }

    /// Validate whether a direct transition from `self` to `target` is allowed.
    ///
    /// Only single hops from the table in [`Stage::successors`] are legal;
    /// there is no transitive reachability.
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        if self.successors().contains(&target) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    /// Whether this stage counts as finished work.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// `true` when `to` is directly reachable from `from`.
#[must_use]
pub fn can_transition(from: Stage, to: Stage) -> bool {
    from.can_transition_to(to).is_ok()
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Eisenhower classification by importance and urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
    /// Urgent and important.
    Do,
    /// Important, not urgent.
    Schedule,
    /// Urgent, not important.
    Delegate,
    /// Neither.
    Eliminate,
}

impl Quadrant {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Do => "do",
            Self::Schedule => "schedule",
            Self::Delegate => "delegate",
            Self::Eliminate => "eliminate",
        }
    }
}

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
    /// Any unrecognized value from stored data; never expands.
    #[serde(other)]
    Unknown,
}

impl RecurrenceKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Unknown => "unknown",
        }
    }
}

/// Repetition rule attached to a recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    pub interval: u32,
}

impl Recurrence {
    #[must_use]
    pub const fn new(kind: RecurrenceKind, interval: u32) -> Self {
        Self { kind, interval }
    }
}

/// A checklist entry owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// The central entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stage: Stage,
    pub priority: Priority,
    pub quadrant: Option<Quadrant>,
    pub due_date: Option<NaiveDate>,
    #[serde(with = "super::hhmm")]
    pub due_time: Option<NaiveTime>,
    pub scheduled_for: Option<NaiveDate>,
    #[serde(with = "super::hhmm")]
    pub scheduled_time: Option<NaiveTime>,
    pub estimated_minutes: Option<u32>,
    pub actual_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub subtasks: Vec<Subtask>,
    pub recurrence: Option<Recurrence>,
    pub is_recurring: bool,
    pub goal_id: Option<String>,
    pub milestone_id: Option<String>,
    #[serde(rename = "isMIT")]
    pub is_mit: bool,
    pub mit_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: None,
            stage: Stage::Inbox,
            priority: Priority::Medium,
            quadrant: None,
            due_date: None,
            due_time: None,
            scheduled_for: None,
            scheduled_time: None,
            estimated_minutes: None,
            actual_minutes: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            recurrence: None,
            is_recurring: false,
            goal_id: None,
            milestone_id: None,
            is_mit: false,
            mit_date: None,
            completed: false,
            completed_at: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: None,
        }
    }
}

impl Task {
    /// `true` when the task is flagged as an MIT for `today` and still open.
    #[must_use]
    pub fn is_mit_on(&self, today: NaiveDate) -> bool {
        self.is_mit && self.mit_date == Some(today) && !self.completed
    }

    /// `true` when the task carries `tag` (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Completed and total subtask counts.
    #[must_use]
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }
}

/// Fields accepted when capturing a new task. Everything except the title is
/// optional and falls back to the task defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub estimated_minutes: Option<u32>,
    pub tags: Vec<String>,
    pub subtasks: Vec<String>,
    pub recurrence: Option<Recurrence>,
    pub goal_id: Option<String>,
    pub milestone_id: Option<String>,
}

impl NewTask {
    /// Shorthand for a task with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Field edits for an existing task. `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub due_time: Option<Option<NaiveTime>>,
    pub estimated_minutes: Option<Option<u32>>,
    pub tags: Option<Vec<String>>,
    pub recurrence: Option<Option<Recurrence>>,
    pub goal_id: Option<Option<String>>,
    pub milestone_id: Option<Option<String>>,
}

/// Error returned when a stage transition is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Stage,
    pub to: Stage,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition {} -> {} is not allowed", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Stage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "inbox" => Ok(Self::Inbox),
            "prioritized" => Ok(Self::Prioritized),
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" | "doing" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "someday" => Ok(Self::Someday),
            _ => Err(ParseEnumError {
                expected: "stage",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Quadrant {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "do" => Ok(Self::Do),
            "schedule" => Ok(Self::Schedule),
            "delegate" => Ok(Self::Delegate),
            "eliminate" => Ok(Self::Eliminate),
            _ => Err(ParseEnumError {
                expected: "quadrant",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for RecurrenceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ParseEnumError {
                expected: "recurrence",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_stage() -> impl Strategy<Value = Stage> {
        prop::sample::select(Stage::ALL.to_vec())
    }

    #[test]
    fn enum_json_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&Stage::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&Quadrant::Do).unwrap(), "\"do\"");
        assert_eq!(
            serde_json::from_str::<Stage>("\"someday\"").unwrap(),
            Stage::Someday
        );
        assert_eq!(
            serde_json::from_str::<RecurrenceKind>("\"yearly\"").unwrap(),
            RecurrenceKind::Unknown
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in Stage::ALL {
            assert_eq!(Stage::from_str(&value.to_string()).unwrap(), value);
        }
        for value in [Priority::High, Priority::Medium, Priority::Low] {
            assert_eq!(Priority::from_str(&value.to_string()).unwrap(), value);
        }
        for value in [
            Quadrant::Do,
            Quadrant::Schedule,
            Quadrant::Delegate,
            Quadrant::Eliminate,
        ] {
            assert_eq!(Quadrant::from_str(&value.to_string()).unwrap(), value);
        }
        assert_eq!(Stage::from_str("In-Progress").unwrap(), Stage::InProgress);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(Stage::from_str("archived").is_err());
        assert!(Priority::from_str("urgent").is_err());
        assert!(Quadrant::from_str("later").is_err());
        assert!(RecurrenceKind::from_str("yearly").is_err());
    }

    #[test]
    fn stage_transition_table() {
        assert!(Stage::Inbox.can_transition_to(Stage::Prioritized).is_ok());
        assert!(Stage::Inbox.can_transition_to(Stage::Done).is_ok());
        assert!(Stage::Scheduled.can_transition_to(Stage::InProgress).is_ok());
        assert!(Stage::Done.can_transition_to(Stage::Inbox).is_ok());
        assert!(Stage::Someday.can_transition_to(Stage::Prioritized).is_ok());

        assert_eq!(
            Stage::Inbox.can_transition_to(Stage::Scheduled),
            Err(InvalidTransition {
                from: Stage::Inbox,
                to: Stage::Scheduled,
            })
        );
        assert!(Stage::Done.can_transition_to(Stage::Prioritized).is_err());
        assert!(Stage::InProgress.can_transition_to(Stage::Inbox).is_err());
        assert!(Stage::Someday.can_transition_to(Stage::Done).is_err());
    }

    #[test]
    fn no_stage_transitions_to_itself() {
        for stage in Stage::ALL {
            assert!(!can_transition(stage, stage), "{stage} -> {stage}");
        }
    }

    #[test]
    fn task_serializes_with_camel_case_keys() {
        let task = Task {
            id: "t-1".into(),
            title: "Write report".into(),
            is_mit: true,
            due_time: NaiveTime::from_hms_opt(9, 30, 0),
            ..Task::default()
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["isMIT"], true);
        assert_eq!(json["dueTime"], "09:30");
        assert_eq!(json["stage"], "inbox");
        assert!(json.get("scheduledFor").is_some());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn task_default_is_stable() {
        let task = Task::default();
        assert_eq!(task.stage, Stage::Inbox);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.is_mit);
        assert!(!task.completed);
        assert!(task.tags.is_empty());
        assert!(task.subtasks.is_empty());
        assert!(task.recurrence.is_none());
    }

    proptest! {
        #[test]
        fn can_transition_matches_successor_table(from in arb_stage(), to in arb_stage()) {
            let listed = from.successors().contains(&to);
            prop_assert_eq!(can_transition(from, to), listed);
        }
    }
}
