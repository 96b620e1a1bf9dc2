//! `cad delete`: remove a task for good.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use super::render_outcome;
use crate::output::OutputMode;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task ID or unique prefix.
    pub id: String,
}

pub fn run_delete(args: &DeleteArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root)?;
    let id = session.resolve_task(&args.id)?;
    let removed = session.planner.engine_mut().delete_task(&id)?;
    session.save()?;
    render_outcome(
        output,
        &format!("Deleted {} {}", removed.id, removed.title),
        serde_json::to_value(&removed)?,
        &[],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_args_parse_id() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: DeleteArgs,
        }
        let w = Wrapper::parse_from(["test", "t-9"]);
        assert_eq!(w.args.id, "t-9");
    }
}
