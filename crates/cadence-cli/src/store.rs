//! On-disk store: one JSON document per aggregate under `.cadence/`, guarded
//! by an advisory lock for the duration of a command.

use cadence_core::config::DATA_DIR;
use cadence_core::goals::GoalBoardSnapshot;
use cadence_core::gamify::Stats;
use cadence_core::snapshot::decode_tasks;
use cadence_core::{ErrorCode, ImportError, PlannerSnapshot};
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const TASKS_KEY: &str = "tasks";
pub const GOALS_KEY: &str = "goals";
pub const STATS_KEY: &str = "stats";

const LOCK_FILE: &str = "lock";

/// Default wait before giving up on another process's lock.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no {DATA_DIR}/ directory in {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("lock timed out after {waited:?} at {}", path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored tasks in {} could not be loaded: {source}", path.display())]
    Tasks {
        path: PathBuf,
        #[source]
        source: ImportError,
    },
}

impl StoreError {
    /// Machine-readable code associated with this store error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::LockTimeout { .. } => ErrorCode::LockContention,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::Tasks { .. } => ErrorCode::MalformedImport,
            Self::Read { .. } | Self::Decode { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// RAII guard for the store-wide exclusive lock.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire an exclusive advisory lock, retrying until `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(|source| StoreError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(StoreError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Return the lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Key/value JSON store rooted at `<project>/.cadence/`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open an existing store.
    pub fn open(project_root: &Path) -> Result<Self, StoreError> {
        let dir = project_root.join(DATA_DIR);
        if !dir.is_dir() {
            return Err(StoreError::NotInitialized(project_root.to_path_buf()));
        }
        Ok(Self { dir })
    }

    /// Create the store directory if missing. Returns the store and whether
    /// it was newly created.
    pub fn create(project_root: &Path) -> Result<(Self, bool), StoreError> {
        let dir = project_root.join(DATA_DIR);
        let created = !dir.is_dir();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok((Self { dir }, created))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn lock(&self, timeout: Duration) -> Result<StoreLock, StoreError> {
        StoreLock::acquire(&self.dir.join(LOCK_FILE), timeout)
    }

    /// Read a document. A missing document is `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode { path, source })
    }

    /// Write a document atomically: temp file in the same directory, then
    /// rename over the old one.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let mut body = serde_json::to_vec_pretty(value).map_err(|err| StoreError::Write {
            path: path.clone(),
            source: io::Error::other(err),
        })?;
        body.push(b'\n');
        fs::write(&tmp, &body).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(key, bytes = body.len(), "document saved");
        Ok(())
    }

    /// Load every aggregate. Stored tasks go through the same migration as
    /// imports so older documents keep loading.
    pub fn load_snapshot(&self) -> Result<PlannerSnapshot, StoreError> {
        let raw_tasks: Vec<serde_json::Value> = self.load(TASKS_KEY)?.unwrap_or_default();
        let tasks = decode_tasks(raw_tasks).map_err(|source| StoreError::Tasks {
            path: self.path_for(TASKS_KEY),
            source,
        })?;
        let goals: GoalBoardSnapshot = self.load(GOALS_KEY)?.unwrap_or_default();
        let stats: Stats = self.load(STATS_KEY)?.unwrap_or_default();
        Ok(PlannerSnapshot {
            tasks,
            goals,
            stats,
        })
    }

    pub fn save_snapshot(&self, snapshot: &PlannerSnapshot) -> Result<(), StoreError> {
        self.save(TASKS_KEY, &snapshot.tasks)?;
        self.save(GOALS_KEY, &snapshot.goals)?;
        self.save(STATS_KEY, &snapshot.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::model::task::{Stage, Task};
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let (store, created) = JsonStore::create(dir.path()).unwrap();
        assert!(created);
        (dir, store)
    }

    #[test]
    fn open_requires_init() {
        let dir = TempDir::new().unwrap();
        let err = JsonStore::open(dir.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotInitialized);
    }

    #[test]
    fn create_is_idempotent() {
        let (dir, _store) = store();
        let (_again, created) = JsonStore::create(dir.path()).unwrap();
        assert!(!created);
    }

    #[test]
    fn missing_documents_load_as_empty_snapshot() {
        let (_dir, store) = store();
        assert_eq!(store.load_snapshot().unwrap(), PlannerSnapshot::default());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let (_dir, store) = store();
        let snapshot = PlannerSnapshot {
            tasks: vec![Task {
                id: "t-1".into(),
                title: "write".into(),
                ..Task::default()
            }],
            ..PlannerSnapshot::default()
        };
        store.save_snapshot(&snapshot).unwrap();
        assert_eq!(store.load_snapshot().unwrap(), snapshot);
        assert!(!store.dir().join(".tasks.json.tmp").exists());
    }

    #[test]
    fn legacy_tasks_are_migrated_on_load() {
        let (_dir, store) = store();
        fs::write(
            store.path_for(TASKS_KEY),
            r#"[{"id":"t-old","title":"old","completed":true}]"#,
        )
        .unwrap();
        let snapshot = store.load_snapshot().unwrap();
        assert_eq!(snapshot.tasks[0].stage, Stage::Done);
    }

    #[test]
    fn corrupt_document_is_reported() {
        let (_dir, store) = store();
        fs::write(store.path_for(STATS_KEY), "{not json").unwrap();
        let err = store.load_snapshot().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn second_lock_times_out() {
        let (_dir, store) = store();
        let held = store.lock(LOCK_TIMEOUT).unwrap();
        let err = store.lock(Duration::from_millis(30)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(held.path().ends_with(LOCK_FILE));
        drop(held);
        assert!(store.lock(Duration::from_millis(30)).is_ok());
    }
}
