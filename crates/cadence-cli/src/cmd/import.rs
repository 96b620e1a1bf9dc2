use anyhow::{Context as _, Result};
use clap::Args;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::render_outcome;
use crate::output::OutputMode;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Export document to load; omit or pass `-` to read from stdin.
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,
}

/// Replace the task collection (and the stats, when present) with the
/// document's contents. A malformed document changes nothing.
pub fn run_import(args: &ImportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let payload = match args.input.as_ref().filter(|p| p.as_os_str() != "-") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read import payload from stdin")?;
            buf
        }
    };

    let mut session = Session::open(project_root)?;
    let count = session.planner.import_json(&payload)?;
    session.save()?;
    render_outcome(
        output,
        &format!("Imported {count} task(s)"),
        serde_json::json!({ "imported": count }),
        &[],
    )
}
