use anyhow::{Context as _, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::session::Session;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output JSON path (defaults to stdout).
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Write the versioned export document (tasks plus stats).
pub fn run_export(args: &ExportArgs, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root)?;
    let document = session.planner.export();

    let mut out: Box<dyn Write> = match args.output.as_ref() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    serde_json::to_writer_pretty(&mut out, &document)?;
    writeln!(out)?;
    out.flush()?;

    if let Some(path) = args.output.as_ref() {
        eprintln!("Exported {} task(s) to {}", document.tasks.len(), path.display());
    }
    Ok(())
}
