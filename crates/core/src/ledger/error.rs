//! Ledger error types.
//!
//! Every failure aborts the whole operation. Only store contention is retryable;
//! the rest are caller-input or business-state problems.

use fundline_shared::types::Money;
use fundline_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// An account holder.
    AccountHolder,
    /// A deposit entry.
    Deposit,
    /// A transfer entry.
    Transfer,
    /// A loan entry.
    Loan,
    /// A repayment entry.
    Repayment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AccountHolder => "Account holder",
            Self::Deposit => "Deposit",
            Self::Transfer => "Transfer",
            Self::Loan => "Loan",
            Self::Repayment => "Repayment",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Referenced record is absent or soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// What was looked up.
        entity: EntityKind,
        /// The missing id.
        id: Uuid,
    },

    /// Entry was already reversed.
    #[error("{entity} {id} has already been reversed")]
    AlreadyReversed {
        /// Kind of entry.
        entity: EntityKind,
        /// The entry id.
        id: Uuid,
    },

    /// Operation is forbidden in the record's current status.
    #[error("{0}")]
    InvalidState(String),

    /// The debited side cannot cover the amount.
    #[error("Insufficient funds in account {account_id}: available {available}, required {required}")]
    InsufficientFunds {
        /// Account being debited.
        account_id: Uuid,
        /// Its current balance.
        available: Money,
        /// Amount the operation needs.
        required: Money,
    },

    /// Structurally nonsensical request.
    #[error("{0}")]
    InvalidOperation(String),

    /// Repayment exceeds the remaining debt.
    #[error("Your remaining debt is {}, not {attempted}", .remaining.to_fixed())]
    Overpayment {
        /// Debt left on the loan.
        remaining: Money,
        /// Amount the caller tried to repay.
        attempted: Money,
    },

    /// Account holder name already taken.
    #[error("{0}")]
    DuplicateName(String),

    /// Lock contention or serialization failure in the store.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for a missing account holder.
    pub(crate) fn account_not_found(id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity: EntityKind::AccountHolder,
            id: id.into(),
        }
    }

    /// An amount or balance that does not fit the decimal range.
    #[must_use]
    pub fn out_of_range() -> Self {
        Self::InvalidOperation("amount out of range".to_string())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AlreadyReversed { .. }
            | Self::InvalidState(_)
            | Self::InsufficientFunds { .. }
            | Self::InvalidOperation(_)
            | Self::Overpayment { .. }
            | Self::DuplicateName(_) => 400,
            Self::ConcurrentModification => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound { .. } => Self::NotFound(message),
            LedgerError::ConcurrentModification => Self::Conflict(message),
            LedgerError::Database(inner) => Self::Database(inner),
            LedgerError::Internal(inner) => Self::Internal(inner),
            LedgerError::AlreadyReversed { .. }
            | LedgerError::InvalidState(_)
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::InvalidOperation(_)
            | LedgerError::Overpayment { .. }
            | LedgerError::DuplicateName(_) => Self::BusinessRule(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::account_not_found(Uuid::nil()).http_status_code(), 404);
        assert_eq!(
            LedgerError::InvalidOperation("same account".into()).http_status_code(),
            400
        );
        assert_eq!(
            LedgerError::AlreadyReversed {
                entity: EntityKind::Deposit,
                id: Uuid::nil(),
            }
            .http_status_code(),
            400
        );
        assert_eq!(LedgerError::ConcurrentModification.http_status_code(), 409);
        assert_eq!(LedgerError::Database("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(!LedgerError::InvalidState(String::new()).is_retryable());
        assert!(!LedgerError::Database(String::new()).is_retryable());
    }

    #[test]
    fn test_overpayment_message_states_remaining_debt() {
        let err = LedgerError::Overpayment {
            remaining: Money::new(dec!(500)),
            attempted: Money::new(dec!(600)),
        };
        assert_eq!(err.to_string(), "Your remaining debt is 500.00, not 600");
        assert_eq!(err.error_code(), "OVERPAYMENT");
    }

    #[test]
    fn test_not_found_message() {
        let err = LedgerError::NotFound {
            entity: EntityKind::Loan,
            id: Uuid::nil(),
        };
        assert_eq!(
            err.to_string(),
            "Loan not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_conversion_to_app_error() {
        let app: AppError = LedgerError::account_not_found(Uuid::nil()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = LedgerError::InsufficientFunds {
            account_id: Uuid::nil(),
            available: Money::new(dec!(50)),
            required: Money::new(dec!(100)),
        }
        .into();
        assert_eq!(app.status_code(), 400);
        assert!(app.to_string().starts_with("Insufficient funds"));

        let app: AppError = LedgerError::ConcurrentModification.into();
        assert_eq!(app.status_code(), 409);
    }
}
