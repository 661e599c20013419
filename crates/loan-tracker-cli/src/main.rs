mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::ledger::LedgerArgs;
use commands::loan::{LoanArgs, SummaryArgs};
use crate::config::CliConfig;

/// Loan amortization schedules and shared loan books
#[derive(Parser)]
#[command(
    name = "loans",
    version,
    about = "Loan amortization schedules and shared loan books",
    long_about = "A CLI for fixed-payment loan amortization with decimal precision. \
                  Computes monthly payments, full schedules and paid-to-date summaries, \
                  and answers the same queries for loans kept in a shared loan book."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to `output` from config, else json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Path to a config file (defaults to ./loans.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed monthly payment and lifetime totals
    Payment(LoanArgs),
    /// Month-by-month amortization schedule
    Schedule(LoanArgs),
    /// Balance and paid-to-date totals after a given month
    Summary(SummaryArgs),
    /// Users, loans and sharing in a loan book file
    Ledger(LedgerArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match CliConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(&cfg.log_filter);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Summary(args) => commands::loan::run_summary(args),
        Commands::Ledger(args) => commands::ledger::run_ledger(args, cfg.ledger.as_deref()),
        Commands::Version => {
            println!("loans {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let format = cli.output.or(cfg.output).unwrap_or(OutputFormat::Json);
    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
