pub mod commands;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "salescope",
    about = "Salescope operator CLI",
    long_about = "Run customer scoring, product analytics, history snapshots and the derived-record read paths over the sales ledger.",
    after_help = "Examples:\n  salescope migrate\n  salescope score\n  salescope analytics --date 2026-06-15\n  salescope alerts --limit 10"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo ledger fixtures and verify them")]
    Seed,
    #[command(about = "Run the customer scoring pipeline over every customer")]
    Score {
        #[arg(long, help = "Run as of this date (YYYY-MM-DD) instead of today")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Run product analytics (ABC/XYZ, turnover, GMROI) and basket mining")]
    Analytics {
        #[arg(long, help = "Run as of this date (YYYY-MM-DD) instead of today")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Write today's history snapshot for every scored customer")]
    Snapshot {
        #[arg(long, help = "Snapshot this calendar day (YYYY-MM-DD) instead of today")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Show customer counts and mean scores per tier")]
    Segments,
    #[command(about = "Show historical snapshots within a trailing window")]
    Trend {
        #[arg(long, help = "Restrict to one customer id")]
        customer: Option<String>,
        #[arg(long, default_value_t = 30, help = "Trailing window length in days")]
        days: i64,
    },
    #[command(about = "List recent score-change alerts, newest first")]
    Alerts {
        #[arg(long, default_value_t = 20, help = "Maximum number of alerts to return")]
        limit: i64,
        #[arg(long, help = "Include alerts that were already acknowledged")]
        all: bool,
    },
    #[command(about = "Acknowledge one alert by id")]
    MarkRead {
        #[arg(help = "Alert id to acknowledge")]
        alert_id: String,
    },
    #[command(about = "Inspect effective configuration and resolved score thresholds")]
    Config,
    #[command(about = "Validate configuration and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Score { date } => commands::score::run(date),
        Command::Analytics { date } => commands::analytics::run(date),
        Command::Snapshot { date } => commands::snapshot::run(date),
        Command::Segments => commands::segments::run(),
        Command::Trend { customer, days } => commands::trend::run(customer, days),
        Command::Alerts { limit, all } => commands::alerts::run(limit, !all),
        Command::MarkRead { alert_id } => commands::mark_read::run(&alert_id),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
