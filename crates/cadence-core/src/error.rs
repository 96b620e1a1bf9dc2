use std::fmt;
use std::path::PathBuf;

use crate::model::task::{InvalidTransition, ParseEnumError, Stage};

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    TaskNotFound,
    SubtaskNotFound,
    GoalNotFound,
    MilestoneNotFound,
    InvalidStateTransition,
    InvalidEnumValue,
    InvalidField,
    MitCapReached,
    MalformedImport,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::TaskNotFound => "E2001",
            Self::InvalidStateTransition => "E2002",
            Self::SubtaskNotFound => "E2003",
            Self::GoalNotFound => "E2004",
            Self::MilestoneNotFound => "E2005",
            Self::InvalidEnumValue => "E2006",
            Self::InvalidField => "E2007",
            Self::MitCapReached => "E2008",
            Self::MalformedImport => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Planner not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::TaskNotFound => "Task not found",
            Self::SubtaskNotFound => "Subtask not found",
            Self::GoalNotFound => "Goal not found",
            Self::MilestoneNotFound => "Milestone not found",
            Self::InvalidStateTransition => "Invalid stage transition",
            Self::InvalidEnumValue => "Invalid enum value",
            Self::InvalidField => "Invalid field value",
            Self::MitCapReached => "Daily MIT limit reached",
            Self::MalformedImport => "Malformed import payload",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users and scripts.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `cad init` to create the .cadence/ directory."),
            Self::ConfigParseError => Some("Fix syntax in .cadence/config.toml and retry."),
            Self::TaskNotFound
            | Self::SubtaskNotFound
            | Self::GoalNotFound
            | Self::MilestoneNotFound => None,
            Self::InvalidStateTransition => Some(
                "Follow the pipeline: inbox -> prioritized -> scheduled -> in_progress -> done.",
            ),
            Self::InvalidEnumValue => Some("Use one of the values listed in `cad --help` for that option."),
            Self::InvalidField => Some("Check the field value and retry."),
            Self::MitCapReached => Some("Unset one of today's MITs before picking another."),
            Self::MalformedImport => {
                Some("The import file must be a JSON object with a `tasks` array.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `cad` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the lifecycle engine, goal board and planner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    #[error("subtask {subtask_id} not found on task {task_id}")]
    SubtaskNotFound { task_id: String, subtask_id: String },

    #[error("goal not found: {id}")]
    GoalNotFound { id: String },

    #[error("milestone not found: {id}")]
    MilestoneNotFound { id: String },

    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition { from: Stage, to: Stage },

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("daily MIT limit of {cap} reached")]
    MitCapReached { cap: usize },
}

impl EngineError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::SubtaskNotFound { .. } => ErrorCode::SubtaskNotFound,
            Self::GoalNotFound { .. } => ErrorCode::GoalNotFound,
            Self::MilestoneNotFound { .. } => ErrorCode::MilestoneNotFound,
            Self::IllegalTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::EmptyTitle | Self::InvalidField { .. } => ErrorCode::InvalidField,
            Self::MitCapReached { .. } => ErrorCode::MitCapReached,
        }
    }

    /// Optional remediation hint for users and scripts.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    pub(crate) fn task_not_found(id: &str) -> Self {
        Self::TaskNotFound { id: id.to_string() }
    }

    pub(crate) fn goal_not_found(id: &str) -> Self {
        Self::GoalNotFound { id: id.to_string() }
    }

    pub(crate) fn milestone_not_found(id: &str) -> Self {
        Self::MilestoneNotFound { id: id.to_string() }
    }
}

impl From<InvalidTransition> for EngineError {
    fn from(err: InvalidTransition) -> Self {
        Self::IllegalTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl ParseEnumError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEnumValue
    }
}

/// A config file exists but is not valid TOML for its schema.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse {}", .path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    #[source]
    pub source: toml::de::Error,
}

impl ConfigError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

/// Failure to accept an import payload. The existing state is untouched.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("import payload must be a JSON object")]
    NotAnObject,

    #[error("import payload has no `tasks` field")]
    MissingTasks,

    #[error("import payload `tasks` must be an array")]
    TasksNotArray,

    #[error("task #{index} could not be decoded: {source}")]
    InvalidTask {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("stats snapshot could not be decoded: {0}")]
    InvalidStats(#[source] serde_json::Error),
}

impl ImportError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedImport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::TaskNotFound,
            ErrorCode::SubtaskNotFound,
            ErrorCode::GoalNotFound,
            ErrorCode::MilestoneNotFound,
            ErrorCode::InvalidStateTransition,
            ErrorCode::InvalidEnumValue,
            ErrorCode::InvalidField,
            ErrorCode::MitCapReached,
            ErrorCode::MalformedImport,
            ErrorCode::StoreWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidStateTransition.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn engine_errors_map_to_codes() {
        let err = EngineError::IllegalTransition {
            from: Stage::Done,
            to: Stage::Scheduled,
        };
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(err.to_string(), "illegal transition: done -> scheduled");

        let err = EngineError::task_not_found("t-1");
        assert_eq!(err.code(), ErrorCode::TaskNotFound);
        assert!(err.hint().is_none());
    }

    #[test]
    fn enum_and_config_errors_have_their_own_codes() {
        let err = "flying".parse::<Stage>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidEnumValue);
        assert_eq!(err.code().code(), "E2006");

        let source = toml::from_str::<toml::Value>("[mit\n").unwrap_err();
        let err = ConfigError {
            path: PathBuf::from(".cadence/config.toml"),
            source,
        };
        assert_eq!(err.code().code(), "E1002");
        assert_eq!(err.to_string(), "failed to parse .cadence/config.toml");
    }
}
