use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::amortization::{self, LoanTerms, ScheduleEntry, SummaryResult};
use crate::error::LoanError;
use crate::types::{LoanId, UserId};
use crate::LoanResult;

const SHARE_DENIED: &str = "You do not have permission to share this loan";

/// A registered user, identified by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// A loan owned by one user and optionally shared with others
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner_id: UserId,
    pub terms: LoanTerms,
    #[serde(default)]
    pub shared_with: Vec<UserId>,
}

impl Loan {
    /// Owner or a user the loan has been shared with
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        self.owner_id == user_id || self.shared_with.contains(&user_id)
    }
}

/// Schedule of a stored loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub loan_id: LoanId,
    pub schedule: Vec<ScheduleEntry>,
}

/// Summary of a stored loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    #[serde(flatten)]
    pub summary: SummaryResult,
}

/// In-memory book of users, loans and share lists.
///
/// Resolves who may see which loan, then hands the loan terms to the
/// amortization engine. Ids are assigned sequentially from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanBook {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    loans: Vec<Loan>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a book from JSON and check its references.
    pub fn from_json(json: &str) -> LoanResult<Self> {
        let book: LoanBook = serde_json::from_str(json)?;
        book.check_integrity()?;
        Ok(book)
    }

    pub fn to_json(&self) -> LoanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_integrity(&self) -> LoanResult<()> {
        let mut user_ids = BTreeSet::new();
        let mut emails = BTreeSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id) {
                return Err(LoanError::InvalidInput {
                    field: "users".into(),
                    reason: format!("duplicate user id {}", user.id),
                });
            }
            let email = normalize_email(&user.email);
            if emails.contains(&email) {
                return Err(LoanError::EmailExists(email));
            }
            emails.insert(email);
        }

        let mut loan_ids = BTreeSet::new();
        for loan in &self.loans {
            if !loan_ids.insert(loan.id) {
                return Err(LoanError::InvalidInput {
                    field: "loans".into(),
                    reason: format!("duplicate loan id {}", loan.id),
                });
            }
            loan.terms.validate()?;
            if !user_ids.contains(&loan.owner_id) {
                return Err(LoanError::UserNotFound(loan.owner_id));
            }
            let mut shared = BTreeSet::new();
            for &user_id in &loan.shared_with {
                if !user_ids.contains(&user_id) {
                    return Err(LoanError::UserNotFound(user_id));
                }
                if user_id == loan.owner_id || !shared.insert(user_id) {
                    return Err(LoanError::AlreadyShared {
                        loan_id: loan.id,
                        user_id,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, user_id: UserId) -> LoanResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(LoanError::UserNotFound(user_id))
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<UserId> {
        let email = normalize_email(email);
        self.users.iter().find(|u| u.email == email).map(|u| u.id)
    }

    /// Register a new user. Fails if the email is malformed or taken.
    pub fn create_user(&mut self, email: &str) -> LoanResult<UserId> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(LoanError::InvalidInput {
                field: "email".into(),
                reason: format!("'{email}' is not a valid email address"),
            });
        }
        if self.users.iter().any(|u| u.email == email) {
            return Err(LoanError::EmailExists(email));
        }

        let id = self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        info!(user_id = id, "created user");
        self.users.push(User { id, email });
        Ok(id)
    }

    /// Id of the user with this email, registering them if needed.
    pub fn ensure_user(&mut self, email: &str) -> LoanResult<UserId> {
        match self.find_user_by_email(email) {
            Some(id) => Ok(id),
            None => self.create_user(email),
        }
    }

    pub fn create_loan(&mut self, owner_id: UserId, terms: LoanTerms) -> LoanResult<&Loan> {
        self.user(owner_id)?;
        terms.validate()?;

        let id = self.loans.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        info!(loan_id = id, owner_id, "created loan");
        self.loans.push(Loan {
            id,
            owner_id,
            terms,
            shared_with: Vec::new(),
        });
        Ok(&self.loans[self.loans.len() - 1])
    }

    pub fn loan(&self, loan_id: LoanId) -> LoanResult<&Loan> {
        self.loans
            .iter()
            .find(|l| l.id == loan_id)
            .ok_or(LoanError::LoanNotFound(loan_id))
    }

    /// Loans the user owns or has been shared, ordered by id.
    pub fn loans_for_user(&self, user_id: UserId) -> LoanResult<Vec<&Loan>> {
        self.user(user_id)?;
        let mut loans: Vec<&Loan> = self
            .loans
            .iter()
            .filter(|l| l.is_visible_to(user_id))
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    /// Share a loan with another user. Only the owner may share.
    ///
    /// Returns the updated list of users the loan is shared with.
    pub fn share_loan(
        &mut self,
        acting_user: UserId,
        loan_id: LoanId,
        target_user: UserId,
    ) -> LoanResult<&[UserId]> {
        let owner_id = self.loan(loan_id)?.owner_id;
        if owner_id != acting_user {
            warn!(loan_id, acting_user, "share rejected: not the loan owner");
            return Err(LoanError::PermissionDenied(SHARE_DENIED.into()));
        }
        self.user(target_user)?;

        let loan = self
            .loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or(LoanError::LoanNotFound(loan_id))?;
        if loan.is_visible_to(target_user) {
            return Err(LoanError::AlreadyShared {
                loan_id,
                user_id: target_user,
            });
        }

        loan.shared_with.push(target_user);
        info!(loan_id, target_user, "shared loan");
        Ok(&loan.shared_with)
    }

    /// Resolve a `(user, loan)` pair the user is allowed to read.
    pub fn authorize(&self, acting_user: UserId, loan_id: LoanId) -> LoanResult<&Loan> {
        self.user(acting_user)?;
        let loan = self.loan(loan_id)?;
        if !loan.is_visible_to(acting_user) {
            warn!(loan_id, acting_user, "access rejected: loan not shared with user");
            return Err(LoanError::NotShared {
                loan_id,
                user_id: acting_user,
            });
        }
        Ok(loan)
    }

    pub fn loan_schedule(&self, acting_user: UserId, loan_id: LoanId) -> LoanResult<LoanSchedule> {
        let loan = self.authorize(acting_user, loan_id)?;
        Ok(LoanSchedule {
            loan_id,
            schedule: amortization::schedule(&loan.terms),
        })
    }

    pub fn loan_summary(
        &self,
        acting_user: UserId,
        loan_id: LoanId,
        month: u32,
    ) -> LoanResult<LoanSummary> {
        let loan = self.authorize(acting_user, loan_id)?;
        Ok(LoanSummary {
            loan_id,
            summary: amortization::summary(&loan.terms, month)?,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
