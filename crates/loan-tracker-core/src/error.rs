use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    /// Target month outside `[1, term_months]`. The only failure the
    /// amortization engine itself produces.
    #[error("Month must be between 1 and {term_months}")]
    InvalidMonth { month: u32, term_months: u32 },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("User with id {0} not found")]
    UserNotFound(u64),

    #[error("Loan with id {0} not found")]
    LoanNotFound(u64),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Loan {loan_id} is not shared with user {user_id}")]
    NotShared { loan_id: u64, user_id: u64 },

    #[error("User {user_id} is already shared on loan {loan_id} or is the loan owner")]
    AlreadyShared { loan_id: u64, user_id: u64 },

    #[error("Email already exists: {0}")]
    EmailExists(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanError {
    fn from(e: serde_json::Error) -> Self {
        LoanError::SerializationError(e.to_string())
    }
}
