use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use loan_tracker_core::ledger::LoanBook;
use loan_tracker_core::{with_metadata, LoanTerms};

use crate::input;

/// Query or update a loan book stored as JSON
#[derive(Args)]
pub struct LedgerArgs {
    /// Path to the loan book JSON file (defaults to `ledger` from config)
    #[arg(long, global = true)]
    pub ledger: Option<String>,

    #[command(subcommand)]
    pub command: LedgerCommand,
}

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Register a user by email (returns the existing id if already present)
    AddUser {
        #[arg(long)]
        email: String,
    },
    /// Create a loan owned by a user
    AddLoan {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        principal: Decimal,
        #[arg(long)]
        rate: Decimal,
        #[arg(long)]
        term: u32,
    },
    /// Share a loan with another user (owner only)
    Share {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        loan: u64,
        #[arg(long)]
        with: u64,
    },
    /// List loans a user owns or has been shared
    Loans {
        #[arg(long)]
        user: u64,
    },
    /// Amortization schedule of a loan visible to the user
    Schedule {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        loan: u64,
    },
    /// Paid-to-date summary of a loan visible to the user
    Summary {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        loan: u64,
        #[arg(long)]
        month: u32,
    },
}

fn load_book(path: &str) -> Result<LoanBook, Box<dyn std::error::Error>> {
    let contents = input::file::read_text(path)?;
    Ok(LoanBook::from_json(&contents)?)
}

fn load_or_create_book(path: &str) -> Result<LoanBook, Box<dyn std::error::Error>> {
    if Path::new(path).exists() {
        load_book(path)
    } else {
        info!(path, "starting new loan book");
        Ok(LoanBook::new())
    }
}

fn save_book(path: &str, book: &LoanBook) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, book.to_json()?)
        .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
    Ok(())
}

pub fn run_ledger(
    args: LedgerArgs,
    default_ledger: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let path = args
        .ledger
        .as_deref()
        .or(default_ledger)
        .ok_or("--ledger <file.json> is required (or set `ledger` in loans.toml)")?
        .to_string();

    let (methodology, result) = match args.command {
        LedgerCommand::AddUser { email } => {
            let mut book = load_or_create_book(&path)?;
            let user_id = book.ensure_user(&email)?;
            save_book(&path, &book)?;
            ("Register user", serde_json::json!({ "user_id": user_id }))
        }
        LedgerCommand::AddLoan {
            user,
            principal,
            rate,
            term,
        } => {
            let mut book = load_book(&path)?;
            let loan = book
                .create_loan(user, LoanTerms::new(principal, rate, term))?
                .clone();
            save_book(&path, &book)?;
            ("Create loan", serde_json::to_value(loan)?)
        }
        LedgerCommand::Share { user, loan, with } => {
            let mut book = load_book(&path)?;
            let shared_with = book.share_loan(user, loan, with)?.to_vec();
            save_book(&path, &book)?;
            (
                "Share loan",
                serde_json::json!({ "loan_id": loan, "shared_with": { "user_ids": shared_with } }),
            )
        }
        LedgerCommand::Loans { user } => {
            let book = load_book(&path)?;
            let loans = book.loans_for_user(user)?;
            ("Loans visible to user", serde_json::json!({ "loans": loans }))
        }
        LedgerCommand::Schedule { user, loan } => {
            let book = load_book(&path)?;
            (
                "Monthly amortization schedule",
                serde_json::to_value(book.loan_schedule(user, loan)?)?,
            )
        }
        LedgerCommand::Summary { user, loan, month } => {
            let book = load_book(&path)?;
            (
                "Paid-to-date loan summary",
                serde_json::to_value(book.loan_summary(user, loan, month)?)?,
            )
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        methodology,
        &serde_json::json!({ "ledger": path }),
        Vec::new(),
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
