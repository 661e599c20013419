pub mod amortization;
pub mod error;
pub mod types;

#[cfg(feature = "ledger")]
pub mod ledger;

pub use amortization::{monthly_payment, schedule, summary, LoanTerms, ScheduleEntry, SummaryResult};
pub use error::LoanError;
pub use types::*;

/// Standard result type for all loan-tracker operations
pub type LoanResult<T> = Result<T, LoanError>;
