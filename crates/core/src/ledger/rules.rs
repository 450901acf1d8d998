//! Business rule checks shared by the engine operations.
//!
//! All checks are pure: they look at already-locked state and either pass or
//! return the error that aborts the operation.

use fundline_shared::types::Money;

use super::error::{EntityKind, LedgerError, LedgerResult};
use super::types::{AccountHolder, EntryStatus, Loan, LoanStatus};

/// Rejects zero and negative amounts.
pub fn ensure_positive(amount: Money) -> LedgerResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidOperation(
            "Amount must be greater than zero".to_string(),
        ))
    }
}

/// Requires `account` to cover `amount`.
pub fn ensure_sufficient_funds(account: &AccountHolder, amount: Money) -> LedgerResult<()> {
    if account.balance >= amount {
        Ok(())
    } else {
        Err(LedgerError::InsufficientFunds {
            account_id: account.id.into_inner(),
            available: account.balance,
            required: amount,
        })
    }
}

/// Requires an entry to still be in effect before reversing it.
pub fn ensure_not_reversed(
    status: EntryStatus,
    entity: EntityKind,
    id: impl Into<uuid::Uuid>,
) -> LedgerResult<()> {
    match status {
        EntryStatus::Completed => Ok(()),
        EntryStatus::Reversed => Err(LedgerError::AlreadyReversed {
            entity,
            id: id.into(),
        }),
    }
}

/// Requires a loan to be in a status that accepts repayments.
pub fn ensure_loan_accepts_repayment(loan: &Loan) -> LedgerResult<()> {
    let reason = match loan.status {
        LoanStatus::Pending | LoanStatus::Active => return Ok(()),
        LoanStatus::Repaid => "This loan has already been fully repaid",
        LoanStatus::Defaulted => "This loan is defaulted and cannot accept repayments",
        LoanStatus::Reversed => "This loan has been reversed and cannot accept repayments",
    };
    Err(LedgerError::InvalidState(reason.to_string()))
}

/// Requires a loan to be reversible: pending with no completed repayments.
///
/// Reversed repayments are ignored, since their money has already gone back.
pub fn ensure_loan_reversible(loan: &Loan, completed_repayments: u64) -> LedgerResult<()> {
    match loan.status {
        LoanStatus::Pending => {}
        LoanStatus::Reversed => {
            return Err(LedgerError::AlreadyReversed {
                entity: EntityKind::Loan,
                id: loan.id.into_inner(),
            });
        }
        status => {
            return Err(LedgerError::InvalidState(format!(
                "Only pending loans can be reversed, this loan is {}",
                status.as_str()
            )));
        }
    }
    if completed_repayments > 0 {
        return Err(LedgerError::InvalidState(
            "Loan has repayments and cannot be reversed".to_string(),
        ));
    }
    Ok(())
}

/// Checks a repayment against the loan's remaining debt.
///
/// Returns the remaining debt before the repayment.
pub fn check_remaining_debt(loan: &Loan, repaid: Money, amount: Money) -> LedgerResult<Money> {
    let remaining = loan.amount - repaid;
    if !remaining.is_positive() {
        return Err(LedgerError::InvalidState(
            "No outstanding debt for this loan".to_string(),
        ));
    }
    if amount > remaining {
        return Err(LedgerError::Overpayment {
            remaining,
            attempted: amount,
        });
    }
    Ok(remaining)
}
