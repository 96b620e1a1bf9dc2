//! Versioned export document and all-or-nothing import.
//!
//! ```json
//! { "version": "2.0", "exportedAt": "...", "tasks": [...], "stats": {...} }
//! ```
//!
//! Older documents may carry the stats under `statsSnapshot`; both keys are
//! accepted on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::gamify::Stats;
use crate::id::{self, TASK_PREFIX};
use crate::model::task::{Stage, Task};

pub const EXPORT_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub stats: Option<Stats>,
}

/// Decoded import payload, ready to replace the live state.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedData {
    pub version: Option<String>,
    pub tasks: Vec<Task>,
    pub stats: Option<Stats>,
}

#[must_use]
pub fn export(tasks: &[Task], stats: Option<&Stats>, now: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        tasks: tasks.to_vec(),
        stats: stats.cloned(),
    }
}

/// Validate and decode an import payload. Nothing is applied here; the
/// caller swaps state in only on `Ok`.
pub fn import(json: &str) -> Result<ImportedData, ImportError> {
    let root: Value = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    let Value::Object(mut map) = root else {
        return Err(ImportError::NotAnObject);
    };

    let tasks = match map.remove("tasks") {
        None => return Err(ImportError::MissingTasks),
        Some(Value::Array(items)) => decode_tasks(items)?,
        Some(_) => return Err(ImportError::TasksNotArray),
    };

    // A null `stats` falls through to the `statsSnapshot` alias.
    let raw_stats = map
        .remove("stats")
        .filter(|value| !value.is_null())
        .or_else(|| map.remove("statsSnapshot"));
    let stats = match raw_stats {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value(value).map_err(ImportError::InvalidStats)?),
    };

    let version = map
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);
    if version.as_deref().is_some_and(|v| v != EXPORT_VERSION) {
        debug!(version = ?version, "importing document from another version");
    }

    Ok(ImportedData {
        version,
        tasks,
        stats,
    })
}

/// Decode raw task values, back-filling missing stages and IDs. Fails on
/// the first element that does not decode.
pub fn decode_tasks(items: Vec<Value>) -> Result<Vec<Task>, ImportError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, mut value)| {
            migrate_task_value(&mut value);
            let mut task: Task = serde_json::from_value(value).map_err(|source| {
                warn!(index, error = %source, "rejecting malformed task");
                ImportError::InvalidTask { index, source }
            })?;
            if task.id.trim().is_empty() {
                task.id = id::new_id(TASK_PREFIX);
            }
            task.is_recurring = task.recurrence.is_some();
            task.completed = task.stage.is_done();
            if !task.completed {
                task.completed_at = None;
            }
            Ok(task)
        })
        .collect()
}

/// Back-fill `stage` on a raw task object that lacks one: `done` when it
/// is marked completed, `inbox` otherwise. Non-objects are left alone.
pub fn migrate_task_value(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };
    if map.get("stage").is_some_and(|s| !s.is_null()) {
        return;
    }
    let completed = map
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let stage = if completed { Stage::Done } else { Stage::Inbox };
    map.insert("stage".to_string(), Value::String(stage.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn export_has_versioned_shape() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let task = Task {
            id: "t-1".into(),
            title: "x".into(),
            ..Task::default()
        };
        let doc = export(&[task], None, now);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], "2.0");
        assert_eq!(value["exportedAt"], "2024-03-01T08:00:00Z");
        assert_eq!(value["tasks"][0]["id"], "t-1");
        assert!(value["stats"].is_null());
    }

    #[test]
    fn missing_stage_is_inferred() {
        let payload = json!({
            "tasks": [
                {"id": "t-1", "title": "old done", "completed": true},
                {"id": "t-2", "title": "old open"}
            ]
        });
        let data = import(&payload.to_string()).unwrap();
        assert_eq!(data.tasks[0].stage, Stage::Done);
        assert!(data.tasks[0].completed);
        assert_eq!(data.tasks[1].stage, Stage::Inbox);
    }

    #[test]
    fn blank_ids_get_fresh_ones() {
        let payload = json!({"tasks": [{"title": "no id"}]});
        let data = import(&payload.to_string()).unwrap();
        assert!(data.tasks[0].id.starts_with("t-"));
    }

    #[test]
    fn structural_failures() {
        assert!(matches!(import("{not json"), Err(ImportError::InvalidJson(_))));
        assert!(matches!(import("[]"), Err(ImportError::NotAnObject)));
        assert!(matches!(import(r#"{"version":"2.0"}"#), Err(ImportError::MissingTasks)));
        assert!(matches!(import(r#"{"tasks":{}}"#), Err(ImportError::TasksNotArray)));
        assert!(matches!(
            import(r#"{"tasks":[{"title":"ok"},{"title":"bad","stage":"flying"}]}"#),
            Err(ImportError::InvalidTask { index: 1, .. })
        ));
        assert!(matches!(
            import(r#"{"tasks":[],"stats":{"totalXP":"lots"}}"#),
            Err(ImportError::InvalidStats(_))
        ));
    }

    #[test]
    fn stats_snapshot_alias_is_accepted() {
        let payload = json!({"tasks": [], "statsSnapshot": {"totalXP": 120}});
        let data = import(&payload.to_string()).unwrap();
        assert_eq!(data.stats.map(|s| s.total_xp), Some(120));
    }

    #[test]
    fn null_stats_defers_to_snapshot_alias() {
        let payload = json!({"tasks": [], "stats": null, "statsSnapshot": {"totalXP": 45}});
        let data = import(&payload.to_string()).unwrap();
        assert_eq!(data.stats.map(|s| s.total_xp), Some(45));

        let payload = json!({"tasks": [], "stats": null});
        assert!(import(&payload.to_string()).unwrap().stats.is_none());
    }

    #[test]
    fn recurrence_flag_follows_rule() {
        let payload = json!({"tasks": [
            {"id": "t-1", "title": "x", "stage": "inbox", "isRecurring": true},
            {"id": "t-2", "title": "y", "stage": "inbox",
             "recurrence": {"type": "daily", "interval": 1}}
        ]});
        let data = import(&payload.to_string()).unwrap();
        assert!(!data.tasks[0].is_recurring);
        assert!(data.tasks[1].is_recurring);
    }
}
