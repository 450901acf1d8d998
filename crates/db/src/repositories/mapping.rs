//! Conversions between entity models and core ledger types.

use chrono::{DateTime, FixedOffset, Utc};
use fundline_core::ledger::{
    AccountHolder, Deposit, EntityKind, EntryStatus, LedgerError, Loan, LoanStatus, Repayment,
    Transfer,
};
use fundline_shared::types::Money;
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

use crate::entities::{
    account_holders, deposits, loans, repayments, sea_orm_active_enums as db_enums, transfers,
};

fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

impl From<db_enums::EntryStatus> for EntryStatus {
    fn from(status: db_enums::EntryStatus) -> Self {
        match status {
            db_enums::EntryStatus::Completed => Self::Completed,
            db_enums::EntryStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<EntryStatus> for db_enums::EntryStatus {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Completed => Self::Completed,
            EntryStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<db_enums::LoanStatus> for LoanStatus {
    fn from(status: db_enums::LoanStatus) -> Self {
        match status {
            db_enums::LoanStatus::Pending => Self::Pending,
            db_enums::LoanStatus::Active => Self::Active,
            db_enums::LoanStatus::Repaid => Self::Repaid,
            db_enums::LoanStatus::Defaulted => Self::Defaulted,
            db_enums::LoanStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<LoanStatus> for db_enums::LoanStatus {
    fn from(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Pending => Self::Pending,
            LoanStatus::Active => Self::Active,
            LoanStatus::Repaid => Self::Repaid,
            LoanStatus::Defaulted => Self::Defaulted,
            LoanStatus::Reversed => Self::Reversed,
        }
    }
}

pub(crate) fn account_from_model(model: account_holders::Model) -> AccountHolder {
    AccountHolder {
        id: model.id.into(),
        name: model.name,
        account_number: model.account_number,
        balance: Money::new(model.balance),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
        deleted_at: model.deleted_at.map(utc),
    }
}

pub(crate) fn deposit_from_model(model: deposits::Model) -> Deposit {
    Deposit {
        id: model.id.into(),
        user_id: model.user_id.into(),
        amount: Money::new(model.amount),
        status: model.status.into(),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn transfer_from_model(model: transfers::Model) -> Transfer {
    Transfer {
        id: model.id.into(),
        sender_id: model.sender_id.into(),
        receiver_id: model.receiver_id.into(),
        amount: Money::new(model.amount),
        status: model.status.into(),
        related_transaction_id: model.related_transaction_id.map(Into::into),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn loan_from_model(model: loans::Model) -> Loan {
    Loan {
        id: model.id.into(),
        lender_id: model.lender_id.into(),
        borrower_id: model.borrower_id.into(),
        amount: Money::new(model.amount),
        interest_rate: model.interest_rate,
        due_date: utc(model.due_date),
        status: model.status.into(),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn repayment_from_model(model: repayments::Model) -> Repayment {
    Repayment {
        id: model.id.into(),
        loan_id: model.loan_id.into(),
        payer_id: model.payer_id.into(),
        amount: Money::new(model.amount),
        status: model.status.into(),
        created_at: utc(model.created_at),
    }
}

/// Row that vanished between lock and update.
pub(crate) fn missing(entity: EntityKind, id: impl Into<Uuid>) -> LedgerError {
    LedgerError::NotFound {
        entity,
        id: id.into(),
    }
}

/// Maps a driver error to the ledger taxonomy.
///
/// Deadlocks (`40P01`) and serialization failures (`40001`) are retryable contention.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        if detail.contains("idx_account_holders_name_active") {
            return LedgerError::DuplicateName(
                "Account name is used try another name".to_string(),
            );
        }
    }
    let message = err.to_string();
    if is_contention(&message) {
        tracing::warn!(error = %message, "ledger transaction lost a lock race");
        return LedgerError::ConcurrentModification;
    }
    tracing::error!(error = %message, "database error");
    LedgerError::Database(message)
}

fn is_contention(message: &str) -> bool {
    ["40P01", "40001", "deadlock detected", "could not serialize access"]
        .iter()
        .any(|needle| message.contains(needle))
}
