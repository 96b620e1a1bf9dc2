#![forbid(unsafe_code)]

mod cmd;
mod output;
mod session;
mod store;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cmd::stage::Shortcut;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cad: GTD task pipeline with goals, milestones and XP",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, env and user config.
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a planner",
        long_about = "Create the .cadence/ directory with a default config and empty documents.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    cad init\n\n    # Wipe stored data and start over\n    cad init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Capture a task into the inbox",
        after_help = "EXAMPLES:\n    # Quick capture\n    cad add \"Call the dentist\"\n\n    # With details\n    cad add \"Weekly review\" -p high --due today --repeat weekly -t review"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "List tasks",
        after_help = "EXAMPLES:\n    # Open tasks\n    cad list\n\n    # Today's agenda\n    cad list --today\n\n    # Everything in progress, as JSON\n    cad list --stage in_progress --json"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Tasks", about = "Show one task")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Edit task fields",
        after_help = "EXAMPLES:\n    # Push the due date\n    cad edit t-1a2b --due +2\n\n    # Link to a milestone\n    cad edit t-1a2b --milestone m-9f"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(next_help_heading = "Tasks", about = "Delete a task")]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Move a task one step along the pipeline",
        long_about = "Move a task along the stage transition table. Only single legal hops are accepted:\n  inbox -> prioritized | done | someday\n  prioritized -> scheduled | inbox | done | someday\n  scheduled -> in_progress | prioritized | done\n  in_progress -> done | scheduled\n  done -> inbox\n  someday -> inbox | prioritized",
        after_help = "EXAMPLES:\n    cad move t-1a2b prioritized"
    )]
    Move(cmd::stage::MoveArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Classify a task into an Eisenhower quadrant",
        after_help = "EXAMPLES:\n    cad prioritize t-1a2b do"
    )]
    Prioritize(cmd::stage::PrioritizeArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Schedule a task for a day",
        after_help = "EXAMPLES:\n    cad schedule t-1a2b tomorrow --at 09:00"
    )]
    Schedule(cmd::stage::ScheduleArgs),

    #[command(next_help_heading = "Pipeline", about = "Start working on a task")]
    Start(cmd::stage::IdArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Complete a task",
        long_about = "Complete a task: awards XP, advances challenges and achievements, updates milestone progress and spawns the next occurrence of a recurring task.",
        after_help = "EXAMPLES:\n    cad done t-1a2b\n\n    # Record the time it took\n    cad done t-1a2b --minutes 40"
    )]
    Done(cmd::stage::DoneArgs),

    #[command(next_help_heading = "Pipeline", about = "Reopen a completed task")]
    Undone(cmd::stage::IdArgs),

    #[command(
        next_help_heading = "Pipeline",
        about = "Send a task back to the inbox, clearing quadrant and schedule"
    )]
    Reset(cmd::stage::IdArgs),

    #[command(next_help_heading = "Pipeline", about = "Park a task for someday")]
    Someday(cmd::stage::IdArgs),

    #[command(next_help_heading = "Pipeline", about = "Bring a someday task back to the inbox")]
    Activate(cmd::stage::IdArgs),

    #[command(
        next_help_heading = "Focus",
        about = "Manage today's most important tasks",
        after_help = "EXAMPLES:\n    cad mit set t-1a2b\n    cad mit list"
    )]
    Mit(cmd::mit::MitArgs),

    #[command(next_help_heading = "Tasks", about = "Manage subtasks")]
    Subtask(cmd::subtask::SubtaskArgs),

    #[command(
        next_help_heading = "Goals",
        about = "Manage goals",
        after_help = "EXAMPLES:\n    cad goal add \"Run a marathon\" --area health --impact 5 --effort 4\n    cad goal list --by-quadrant"
    )]
    Goal(cmd::goal::GoalArgs),

    #[command(
        next_help_heading = "Goals",
        about = "Manage milestones",
        after_help = "EXAMPLES:\n    cad milestone add g-3c \"Run 10k\" --deadline 2025-06-01"
    )]
    Milestone(cmd::goal::MilestoneArgs),

    #[command(next_help_heading = "Goals", about = "Per life-area goal overview")]
    Areas,

    #[command(next_help_heading = "Progress", about = "Level, XP, streak and weekly activity")]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Progress",
        about = "Log focused work",
        after_help = "EXAMPLES:\n    cad focus 25"
    )]
    Focus(cmd::stats::FocusArgs),

    #[command(next_help_heading = "Progress", about = "This week's challenges")]
    Challenges,

    #[command(next_help_heading = "Progress", about = "Achievement catalog and unlocks")]
    Achievements,

    #[command(
        next_help_heading = "Data",
        about = "Export tasks and stats as JSON",
        after_help = "EXAMPLES:\n    cad export -o backup.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Replace tasks (and stats) from an export document",
        after_help = "EXAMPLES:\n    cad import backup.json\n    cat backup.json | cad import -"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    cad completions bash > ~/.local/share/bash-completion/completions/cad"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    let format = env::var("CADENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(command: Commands, output: OutputMode, project_root: &std::path::Path) -> anyhow::Result<()> {
    match command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, project_root),
        Commands::Add(ref args) => cmd::add::run_add(args, output, project_root),
        Commands::List(ref args) => cmd::list::run_list(args, output, project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, project_root),
        Commands::Edit(ref args) => cmd::edit::run_edit(args, output, project_root),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, output, project_root),
        Commands::Move(ref args) => cmd::stage::run_move(args, output, project_root),
        Commands::Prioritize(ref args) => cmd::stage::run_prioritize(args, output, project_root),
        Commands::Schedule(ref args) => cmd::stage::run_schedule(args, output, project_root),
        Commands::Done(ref args) => cmd::stage::run_done(args, output, project_root),
        Commands::Start(ref args) => {
            cmd::stage::run_shortcut(Shortcut::Start, args, output, project_root)
        }
        Commands::Undone(ref args) => {
            cmd::stage::run_shortcut(Shortcut::Undone, args, output, project_root)
        }
        Commands::Reset(ref args) => {
            cmd::stage::run_shortcut(Shortcut::Reset, args, output, project_root)
        }
        Commands::Someday(ref args) => {
            cmd::stage::run_shortcut(Shortcut::Someday, args, output, project_root)
        }
        Commands::Activate(ref args) => {
            cmd::stage::run_shortcut(Shortcut::Activate, args, output, project_root)
        }
        Commands::Mit(ref args) => cmd::mit::run_mit(args, output, project_root),
        Commands::Subtask(ref args) => cmd::subtask::run_subtask(args, output, project_root),
        Commands::Goal(ref args) => cmd::goal::run_goal(args, output, project_root),
        Commands::Milestone(ref args) => cmd::goal::run_milestone(args, output, project_root),
        Commands::Areas => cmd::goal::run_areas(output, project_root),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, output, project_root),
        Commands::Focus(ref args) => cmd::stats::run_focus(args, output, project_root),
        Commands::Challenges => cmd::stats::run_challenges(output, project_root),
        Commands::Achievements => cmd::stats::run_achievements(output, project_root),
        Commands::Export(ref args) => cmd::export::run_export(args, project_root),
        Commands::Import(ref args) => cmd::import::run_import(args, output, project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command)
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    if let Err(err) = run(cli.command, output, &project_root) {
        render_error(output, &CliError::from_anyhow(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
