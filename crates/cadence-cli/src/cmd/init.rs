use anyhow::{Context as _, Result};
use cadence_core::PlannerSnapshot;
use cadence_core::config::DATA_DIR;
use clap::Args;
use std::path::Path;

use crate::output::{OutputMode, render_success};
use crate::store::{JsonStore, LOCK_TIMEOUT};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if `.cadence/` already exists. Stored data is
    /// wiped; the config file is kept.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[mit]\n\
    daily_cap = 3\n\
    \n\
    [xp]\n\
    high = 50\n\
    medium = 30\n\
    low = 15\n\
    fallback = 20\n\
    \n\
    [history]\n\
    keep_days = 90\n\
    \n\
    [challenges]\n\
    enabled = true\n";

const GITIGNORE: &str = "lock\n.*.tmp\n";

/// Execute `cad init`. Creates the project skeleton:
///
/// ```text
/// .cadence/
///   config.toml   (default project config)
///   .gitignore    (lock file, temp files)
///   tasks.json, goals.json, stats.json
/// ```
///
/// # Errors
///
/// Returns an error if `.cadence/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    if project_root.join(DATA_DIR).exists() && !args.force {
        anyhow::bail!("{DATA_DIR}/ already exists. Use `cad init --force` to reinitialize.");
    }

    let (store, _created) = JsonStore::create(project_root)?;
    let _lock = store.lock(LOCK_TIMEOUT)?;

    let config_path = store.dir().join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }
    let gitignore_path = store.dir().join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;

    store.save_snapshot(&PlannerSnapshot::default())?;

    render_success(
        output,
        &format!("Initialized planner in {}", store.dir().display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::config::{ProjectConfig, load_project_config};
    use tempfile::TempDir;

    #[test]
    fn init_creates_skeleton() {
        let dir = TempDir::new().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Text, dir.path()).unwrap();
        let data = dir.path().join(DATA_DIR);
        assert!(data.join("config.toml").exists());
        assert!(data.join("tasks.json").exists());
        assert!(data.join("goals.json").exists());
        assert!(data.join("stats.json").exists());
    }

    #[test]
    fn default_config_template_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Text, dir.path()).unwrap();
        assert_eq!(load_project_config(dir.path()).unwrap(), ProjectConfig::default());
    }

    #[test]
    fn second_init_requires_force() {
        let dir = TempDir::new().unwrap();
        run_init(&InitArgs { force: false }, OutputMode::Text, dir.path()).unwrap();
        assert!(run_init(&InitArgs { force: false }, OutputMode::Text, dir.path()).is_err());
        run_init(&InitArgs { force: true }, OutputMode::Text, dir.path()).unwrap();
    }
}
