use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_tracker_core::amortization::{self, LoanTerms};

use crate::input;

/// Loan terms given as flags, a JSON file or piped JSON
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate as a fraction (0.05 = 5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly payments
    #[arg(long)]
    pub term: Option<u32>,
}

/// Arguments for a point-in-month summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Month to summarise (1-based)
    #[arg(long)]
    pub month: u32,
}

fn resolve_terms(args: LoanArgs) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let (Some(principal), Some(rate), Some(term)) = (args.principal, args.rate, args.term) {
        return Ok(LoanTerms::new(principal, rate, term));
    }
    if let Some(terms) = input::stdin::read_stdin()? {
        return Ok(terms);
    }

    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
    let term = args.term.ok_or("--term is required (or provide --input)")?;
    Ok(LoanTerms::new(principal, rate, term))
}

pub fn run_payment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args)?;
    let result = amortization::analyze_payment(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args)?;
    let result = amortization::analyze_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args.loan)?;
    let result = amortization::analyze_summary(&terms, args.month)?;
    Ok(serde_json::to_value(result)?)
}
