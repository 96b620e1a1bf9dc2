//! One command's view of the planner: lock the store, load every
//! aggregate, run the daily housekeeping pass, and write back on request.

use anyhow::Context;
use cadence_core::config::load_project_config;
use cadence_core::gamify::Reward;
use cadence_core::planner::DayStart;
use cadence_core::{EngineError, Planner};
use std::path::Path;
use tracing::debug;

use crate::store::{JsonStore, LOCK_TIMEOUT, StoreLock};

pub struct Session {
    store: JsonStore,
    _lock: StoreLock,
    pub planner: Planner,
    pub day: DayStart,
}

impl Session {
    /// Open the planner rooted at `project_root`. The store stays locked
    /// until the session is dropped.
    pub fn open(project_root: &Path) -> anyhow::Result<Self> {
        let store = JsonStore::open(project_root)?;
        let lock = store.lock(LOCK_TIMEOUT)?;
        let config = load_project_config(project_root)?;
        let snapshot = store.load_snapshot()?;
        let mut planner = Planner::open(snapshot, config);
        let day = planner.start_day();
        debug!(tasks = planner.engine().tasks().len(), "session opened");
        let session = Self {
            store,
            _lock: lock,
            planner,
            day,
        };
        // Housekeeping results are persisted even by read-only commands so a
        // freshly drawn challenge set stays stable.
        if day.challenges_generated || day.expired_mits > 0 || day.pruned_days > 0 {
            session.save()?;
        }
        Ok(session)
    }

    /// Persist every aggregate.
    pub fn save(&self) -> anyhow::Result<()> {
        self.store
            .save_snapshot(&self.planner.snapshot())
            .context("saving planner state")
    }

    /// Rewards queued by the mutations of this session.
    pub fn drain_rewards(&mut self) -> Vec<Reward> {
        self.planner.gamification_mut().drain_rewards()
    }

    pub fn resolve_task(&self, raw: &str) -> Result<String, EngineError> {
        resolve_id(
            raw,
            self.planner.engine().tasks().iter().map(|t| t.id.as_str()),
        )
        .ok_or_else(|| EngineError::TaskNotFound {
            id: raw.to_string(),
        })
    }

    pub fn resolve_goal(&self, raw: &str) -> Result<String, EngineError> {
        resolve_id(raw, self.planner.goals().goals().iter().map(|g| g.id.as_str())).ok_or_else(
            || EngineError::GoalNotFound {
                id: raw.to_string(),
            },
        )
    }

    pub fn resolve_milestone(&self, raw: &str) -> Result<String, EngineError> {
        resolve_id(
            raw,
            self.planner.goals().milestones().iter().map(|m| m.id.as_str()),
        )
        .ok_or_else(|| EngineError::MilestoneNotFound {
            id: raw.to_string(),
        })
    }
}

/// Match `raw` against `ids`: an exact hit wins, otherwise a unique prefix.
/// Ambiguous or missing prefixes resolve to nothing.
pub fn resolve_id<'a>(raw: &str, ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut matched: Option<&str> = None;
    let mut ambiguous = false;
    for id in ids {
        if id == raw {
            return Some(id.to_string());
        }
        if id.starts_with(raw) {
            ambiguous |= matched.is_some();
            matched = Some(id);
        }
    }
    if ambiguous {
        debug!(prefix = raw, "ambiguous id prefix");
        return None;
    }
    matched.map(str::to_string)
}
