use std::io::Write;

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `cad completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `args.shell` to stdout.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    write_completions(args.shell, command, &mut stdout.lock())
}

/// Completions are keyed to the command's own name so a renamed binary
/// still completes.
fn write_completions(
    shell: Shell,
    command: &mut clap::Command,
    out: &mut dyn Write,
) -> Result<()> {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_mention_nested_commands() {
        let mut command = clap::Command::new("cad")
            .subcommand(clap::Command::new("milestone"))
            .subcommand(clap::Command::new("someday"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("_cad"));
        assert!(script.contains("milestone"));
        assert!(script.contains("someday"));
    }
}
