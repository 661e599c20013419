use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::LoanError;
use crate::types::*;
use crate::LoanResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Financial terms of a fixed-payment loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub term_months: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_interest_rate: Rate, term_months: u32) -> Self {
        Self {
            principal,
            annual_interest_rate,
            term_months,
        }
    }

    /// Nominal annual rate divided by 12
    pub fn monthly_rate(&self) -> Rate {
        self.annual_interest_rate / MONTHS_PER_YEAR
    }

    /// Check the ranges the engine assumes. The engine never calls this
    /// itself; it is for whoever accepts terms from the outside.
    pub fn validate(&self) -> LoanResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanError::InvalidInput {
                field: "principal".into(),
                reason: "Loan amount must be positive".into(),
            });
        }
        if self.annual_interest_rate < Decimal::ZERO {
            return Err(LoanError::InvalidInput {
                field: "annual_interest_rate".into(),
                reason: "Interest rate cannot be negative".into(),
            });
        }
        if self.term_months == 0 {
            return Err(LoanError::InvalidInput {
                field: "term_months".into(),
                reason: "Term must be at least 1 month".into(),
            });
        }
        // principal * (1 + r) * n bounds every payment, balance and running total
        let ceiling = Decimal::ONE
            .checked_add(self.monthly_rate())
            .and_then(|growth| self.principal.checked_mul(growth))
            .and_then(|v| v.checked_mul(Decimal::from(self.term_months)));
        if ceiling.is_none() {
            return Err(LoanError::InvalidInput {
                field: "principal".into(),
                reason: "Total repayment exceeds the supported decimal range".into(),
            });
        }
        Ok(())
    }
}

/// A single reported month in an amortization schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub monthly_payment: Money,
    pub remaining_balance: Money,
}

/// Paid-to-date position of a loan after a given month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub month: u32,
    #[serde(alias = "principal_balance")]
    pub remaining_balance: Money,
    pub aggregate_principal_paid: Money,
    pub aggregate_interest_paid: Money,
}

/// One unrounded month of the amortization loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmortizationStep {
    pub month: u32,
    pub interest: Money,
    pub principal_payment: Money,
    pub balance: Money,
}

impl AmortizationStep {
    fn to_entry(self, monthly_payment: Money) -> ScheduleEntry {
        ScheduleEntry {
            month: self.month,
            monthly_payment: round_currency(monthly_payment),
            remaining_balance: round_currency(self.balance),
        }
    }
}

/// Month-by-month balance decay of a loan.
///
/// Yields exactly `term_months` steps. Every step carries full precision;
/// nothing is rounded until a caller reports it.
#[derive(Debug, Clone)]
pub struct Amortization {
    monthly_rate: Rate,
    payment: Money,
    balance: Money,
    month: u32,
    term_months: u32,
}

impl Amortization {
    pub fn new(terms: &LoanTerms) -> Self {
        Self {
            monthly_rate: terms.monthly_rate(),
            payment: monthly_payment(terms),
            balance: terms.principal,
            month: 0,
            term_months: terms.term_months,
        }
    }

    /// The unrounded fixed payment driving every step
    pub fn payment(&self) -> Money {
        self.payment
    }
}

impl Iterator for Amortization {
    type Item = AmortizationStep;

    fn next(&mut self) -> Option<AmortizationStep> {
        if self.month >= self.term_months {
            return None;
        }
        self.month += 1;

        let interest = self.balance * self.monthly_rate;
        let principal_payment = self.payment - interest;
        // Drift on the final month can leave a negative residue
        self.balance = (self.balance - principal_payment).max(Decimal::ZERO);

        Some(AmortizationStep {
            month: self.month,
            interest,
            principal_payment,
            balance: self.balance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.term_months - self.month) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Amortization {}

/// Fixed monthly payment from the annuity formula, unrounded.
///
/// `P * r / (1 - (1 + r)^-n)` for a positive monthly rate `r`, and `P / n`
/// when the loan carries no interest.
pub fn monthly_payment(terms: &LoanTerms) -> Money {
    let rate = terms.monthly_rate();
    let periods = Decimal::from(terms.term_months);

    if rate <= Decimal::ZERO {
        return terms.principal / periods;
    }

    match (Decimal::ONE + rate).checked_powi(i64::from(terms.term_months)) {
        Some(factor) if factor > Decimal::ONE => {
            terms.principal * rate / (Decimal::ONE - Decimal::ONE / factor)
        }
        Some(_) => terms.principal / periods,
        // (1 + r)^n beyond Decimal range: the discount term vanishes
        None => terms.principal * rate,
    }
}

/// Start the month-by-month loop for a loan
pub fn amortize(terms: &LoanTerms) -> Amortization {
    Amortization::new(terms)
}

/// Full amortization schedule, one entry per month in ascending order.
pub fn schedule(terms: &LoanTerms) -> Vec<ScheduleEntry> {
    debug!(
        principal = %terms.principal,
        rate = %terms.annual_interest_rate,
        term_months = terms.term_months,
        "computing amortization schedule"
    );
    let steps = amortize(terms);
    let payment = steps.payment();
    steps.map(|step| step.to_entry(payment)).collect()
}

/// Balance and paid-to-date totals after `target_month`.
///
/// Totals are sums of the unrounded monthly interest and principal, rounded
/// once at the end.
pub fn summary(terms: &LoanTerms, target_month: u32) -> LoanResult<SummaryResult> {
    if target_month == 0 || target_month > terms.term_months {
        return Err(LoanError::InvalidMonth {
            month: target_month,
            term_months: terms.term_months,
        });
    }
    debug!(
        principal = %terms.principal,
        rate = %terms.annual_interest_rate,
        term_months = terms.term_months,
        target_month,
        "computing loan summary"
    );

    let mut balance = terms.principal;
    let mut total_interest_paid = Decimal::ZERO;
    let mut total_principal_paid = Decimal::ZERO;

    for step in amortize(terms).take(target_month as usize) {
        total_interest_paid += step.interest;
        total_principal_paid += step.principal_payment;
        balance = step.balance;
    }

    Ok(SummaryResult {
        month: target_month,
        remaining_balance: round_currency(balance),
        aggregate_principal_paid: round_currency(total_principal_paid),
        aggregate_interest_paid: round_currency(total_interest_paid),
    })
}

// ---------------------------------------------------------------------------
// Enveloped analyses
// ---------------------------------------------------------------------------

/// Payment overview for a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutput {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
}

/// Full schedule plus lifetime totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub schedule: Vec<ScheduleEntry>,
}

fn terms_assumptions(terms: &LoanTerms) -> serde_json::Value {
    serde_json::json!({
        "principal": terms.principal.to_string(),
        "annual_interest_rate": terms.annual_interest_rate.to_string(),
        "monthly_rate": terms.monthly_rate().to_string(),
        "term_months": terms.term_months,
    })
}

fn terms_warnings(terms: &LoanTerms) -> Vec<String> {
    let mut warnings = Vec::new();
    if terms.annual_interest_rate.is_zero() {
        warnings.push("Zero interest rate: principal repaid in equal instalments".into());
    }
    warnings
}

/// Validate the terms and report the fixed payment with lifetime totals.
pub fn analyze_payment(terms: &LoanTerms) -> LoanResult<ComputationOutput<PaymentOutput>> {
    let start = Instant::now();
    terms.validate()?;

    let payment = monthly_payment(terms);
    let total_interest: Money = amortize(terms).map(|step| step.interest).sum();
    let output = PaymentOutput {
        monthly_payment: round_currency(payment),
        total_paid: round_currency(terms.principal + total_interest),
        total_interest: round_currency(total_interest),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment annuity",
        &terms_assumptions(terms),
        terms_warnings(terms),
        elapsed,
        output,
    ))
}

/// Validate the terms and build the full schedule.
pub fn analyze_schedule(terms: &LoanTerms) -> LoanResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    terms.validate()?;

    let total_interest: Money = amortize(terms).map(|step| step.interest).sum();
    let output = ScheduleOutput {
        monthly_payment: round_currency(monthly_payment(terms)),
        total_interest: round_currency(total_interest),
        schedule: schedule(terms),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly amortization schedule",
        &terms_assumptions(terms),
        terms_warnings(terms),
        elapsed,
        output,
    ))
}

/// Validate the terms and summarise the loan after `target_month`.
pub fn analyze_summary(
    terms: &LoanTerms,
    target_month: u32,
) -> LoanResult<ComputationOutput<SummaryResult>> {
    let start = Instant::now();
    terms.validate()?;

    let output = summary(terms, target_month)?;

    let mut assumptions = terms_assumptions(terms);
    assumptions["target_month"] = serde_json::json!(target_month);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Paid-to-date loan summary",
        &assumptions,
        terms_warnings(terms),
        elapsed,
        output,
    ))
}
