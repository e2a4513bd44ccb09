#![forbid(unsafe_code)]

mod cmd;
mod output;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use cmd::Context;
use leaflog_core::config::resolve_config;
use leaflog_core::ErrorCode;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "leaf: houseplant care log with point-in-time status",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output. Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a leaflog store",
        long_about = "Create .leaflog/ with a migrated store and default config in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    leaf init\n\n    # Rewrite config.toml, keeping the store\n    leaf init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Plants",
        about = "Manage plants",
        after_help = "EXAMPLES:\n    # Add a plant\n    leaf plant add Monstera --location \"living room\" --planted 2024-01-01\n\n    # Show a plant as it was on a date\n    leaf plant show 1 --as-of 2024-03-01\n\n    # Move a plant\n    leaf plant update 1 --location \"bedroom window\"\n\n    # List plants as JSON\n    leaf plant list --json"
    )]
    Plant {
        #[command(subcommand)]
        command: cmd::plant::PlantCommand,
    },

    #[command(
        next_help_heading = "Plants",
        about = "Record a growth measurement",
        after_help = "EXAMPLES:\n    leaf measure 1 --height 42.5 --leaves 9\n    leaf measure 1 --flowers 3 --at 2024-05-01"
    )]
    Measure(cmd::measure::MeasureArgs),

    #[command(
        next_help_heading = "Log",
        about = "Append to or list a plant's event log",
        long_about = "The event log is append-only. Events may be backdated with --at; status is always derived from event dates."
    )]
    Event {
        #[command(subcommand)]
        command: cmd::event::EventCommand,
    },

    #[command(
        next_help_heading = "Log",
        about = "Show a plant's status at an instant",
        after_help = "EXAMPLES:\n    # Current status\n    leaf status 1\n\n    # Status on a past date\n    leaf status 1 --at 2024-02-15"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Log",
        about = "Show status transitions over a range",
        long_about = "Show the status in effect at --from, then every change up to and including --to.",
        after_help = "EXAMPLES:\n    leaf history 1\n    leaf history 1 --from 2024-01-01 --to 2024-06-30 --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Log",
        about = "Show growth measurements in a trailing window",
        after_help = "EXAMPLES:\n    leaf growth 1\n    leaf growth 1 --days 90"
    )]
    Growth(cmd::growth::GrowthArgs),

    #[command(
        next_help_heading = "Care",
        about = "Manage recurring care reminders"
    )]
    Reminder {
        #[command(subcommand)]
        command: cmd::reminder::ReminderCommand,
    },

    #[command(
        next_help_heading = "Care",
        about = "Raise notifications for overdue reminders",
        long_about = "Raise one notification per overdue reminder and due date. Running it again creates no duplicates."
    )]
    Notify(cmd::notifications::NotifyArgs),

    #[command(next_help_heading = "Care", about = "List unread notifications")]
    Notifications(cmd::notifications::NotificationsArgs),

    #[command(next_help_heading = "Care", about = "Mark a notification read")]
    Read(cmd::notifications::ReadArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show collection-wide counters",
        after_help = "EXAMPLES:\n    leaf dashboard\n    leaf dashboard --as-of 2024-06-01 --json"
    )]
    Dashboard(cmd::dashboard::DashboardArgs),

    #[command(next_help_heading = "Reports", about = "Report on one plant")]
    Report(cmd::report::ReportArgs),

    #[command(next_help_heading = "Reports", about = "One line per plant")]
    Overview(cmd::report::OverviewArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Verify or rebuild the cached current status"
    )]
    Cache {
        #[command(subcommand)]
        command: cmd::cache::CacheCommand,
    },

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    leaf completions bash > /etc/bash_completion.d/leaf"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LEAFLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "leaflog=debug,info"
        } else {
            "leaflog=info,warn"
        })
    });

    let format = env::var("LEAFLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = env::current_dir()?;
    let effective = match resolve_config(&project_root, cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            let code = ErrorCode::ConfigParseError;
            let mode = cli.format.unwrap_or(if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            });
            render_error(
                mode,
                &CliError::with_details(
                    format!("{err:#}"),
                    code.hint().unwrap_or(code.message()),
                    code.code(),
                ),
            )?;
            return Err(err);
        }
    };
    let ctx = Context {
        project_root,
        store_path: effective.store_path,
        config: effective.project,
        output: resolve_output_mode(cli.format, &effective.resolved_output),
        now: Utc::now(),
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Plant { command } => cmd::plant::run_plant(command, &ctx),
        Commands::Measure(args) => cmd::measure::run_measure(args, &ctx),
        Commands::Event { command } => cmd::event::run_event(command, &ctx),
        Commands::Status(args) => cmd::status::run_status(args, &ctx),
        Commands::History(args) => cmd::history::run_history(args, &ctx),
        Commands::Growth(args) => cmd::growth::run_growth(args, &ctx),
        Commands::Reminder { command } => cmd::reminder::run_reminder(command, &ctx),
        Commands::Notify(args) => cmd::notifications::run_notify(args, &ctx),
        Commands::Notifications(args) => cmd::notifications::run_notifications(args, &ctx),
        Commands::Read(args) => cmd::notifications::run_read(args, &ctx),
        Commands::Dashboard(args) => cmd::dashboard::run_dashboard(args, &ctx),
        Commands::Report(args) => cmd::report::run_report(args, &ctx),
        Commands::Overview(args) => cmd::report::run_overview(args, &ctx),
        Commands::Cache { command } => cmd::cache::run_cache(command, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}
