//! Domain types for account holders and the four ledger entry kinds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use fundline_shared::types::{
    AccountHolderId, DepositId, LoanId, Money, RepaymentId, TransferId,
};

/// Status shared by deposits, transfers and repayments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is in effect.
    Completed,
    /// Entry has been reversed and no longer affects balances.
    Reversed,
}

impl EntryStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Reversed => "reversed",
        }
    }
}

/// Loan lifecycle status.
///
/// Loans are created `Pending`. `Repaid`, `Defaulted` and `Reversed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Disbursed, awaiting repayment.
    Pending,
    /// Disbursed and being repaid.
    Active,
    /// Fully repaid.
    Repaid,
    /// Written off.
    Defaulted,
    /// Cancelled before any repayment.
    Reversed,
}

impl LoanStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Repaid => "repaid",
            Self::Defaulted => "defaulted",
            Self::Reversed => "reversed",
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Repaid | Self::Defaulted | Self::Reversed)
    }

    /// Returns true while the loan still has debt that can be repaid.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

/// An account holder and its current balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolder {
    /// Unique identifier.
    pub id: AccountHolderId,
    /// Display name, unique among non-deleted holders.
    pub name: String,
    /// External account number.
    pub account_number: String,
    /// Current balance. Never persisted negative.
    pub balance: Money,
    /// When the holder was created.
    pub created_at: DateTime<Utc>,
    /// When the holder was last modified.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AccountHolder {
    /// Returns true unless the holder has been soft-deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Money paid into one account from outside the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    /// Unique identifier.
    pub id: DepositId,
    /// Owning account.
    pub user_id: AccountHolderId,
    /// Deposited amount.
    pub amount: Money,
    /// Current status.
    pub status: EntryStatus,
    /// When the deposit was recorded.
    pub created_at: DateTime<Utc>,
}

/// Money moved between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Unique identifier.
    pub id: TransferId,
    /// Debited account.
    pub sender_id: AccountHolderId,
    /// Credited account.
    pub receiver_id: AccountHolderId,
    /// Transferred amount.
    pub amount: Money,
    /// Current status.
    pub status: EntryStatus,
    /// Links an original transfer and its reversal in both directions.
    pub related_transaction_id: Option<TransferId>,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

/// A loan between two accounts.
///
/// `amount` is the total credited to the borrower (principal plus interest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Unique identifier.
    pub id: LoanId,
    /// Account that funded the loan.
    pub lender_id: AccountHolderId,
    /// Account that received the loan.
    pub borrower_id: AccountHolderId,
    /// Total owed: principal plus interest.
    pub amount: Money,
    /// Interest rate in percent.
    pub interest_rate: Decimal,
    /// When the loan falls due.
    pub due_date: DateTime<Utc>,
    /// Current status.
    pub status: LoanStatus,
    /// When the loan was recorded.
    pub created_at: DateTime<Utc>,
}

/// A repayment towards a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repayment {
    /// Unique identifier.
    pub id: RepaymentId,
    /// Loan being repaid.
    pub loan_id: LoanId,
    /// Account that paid.
    pub payer_id: AccountHolderId,
    /// Repaid amount.
    pub amount: Money,
    /// Current status.
    pub status: EntryStatus,
    /// When the repayment was recorded.
    pub created_at: DateTime<Utc>,
}

// ========== Engine inputs ==========

/// Input for creating a deposit.
#[derive(Debug, Clone)]
pub struct CreateDepositInput {
    /// Account to credit.
    pub user_id: AccountHolderId,
    /// Amount to deposit.
    pub amount: Money,
}

/// Input for creating a transfer.
#[derive(Debug, Clone)]
pub struct CreateTransferInput {
    /// Account to debit.
    pub sender_id: AccountHolderId,
    /// Account to credit.
    pub receiver_id: AccountHolderId,
    /// Amount to move.
    pub amount: Money,
}

/// Input for creating a loan.
#[derive(Debug, Clone)]
pub struct CreateLoanInput {
    /// Account funding the loan.
    pub lender_id: AccountHolderId,
    /// Account receiving the loan.
    pub borrower_id: AccountHolderId,
    /// Principal debited from the lender.
    pub amount: Money,
    /// Interest rate in percent.
    pub interest_rate: Decimal,
    /// Due date, defaults to the creation time.
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for creating a repayment.
#[derive(Debug, Clone)]
pub struct CreateRepaymentInput {
    /// Loan to repay.
    pub loan_id: LoanId,
    /// Account paying.
    pub payer_id: AccountHolderId,
    /// Amount to repay.
    pub amount: Money,
}

/// Input for creating or updating an account holder.
#[derive(Debug, Clone)]
pub struct AccountHolderInput {
    /// Display name.
    pub name: String,
    /// External account number.
    pub account_number: String,
}

// ========== Store rows to insert ==========

/// Deposit row to insert.
#[derive(Debug, Clone)]
pub struct NewDeposit {
    /// Owning account.
    pub user_id: AccountHolderId,
    /// Deposited amount.
    pub amount: Money,
}

/// Transfer row to insert, always `Completed`.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    /// Debited account.
    pub sender_id: AccountHolderId,
    /// Credited account.
    pub receiver_id: AccountHolderId,
    /// Transferred amount.
    pub amount: Money,
    /// Original transfer when this row is a reversal.
    pub related_transaction_id: Option<TransferId>,
}

/// Loan row to insert, always `Pending`.
#[derive(Debug, Clone)]
pub struct NewLoan {
    /// Account that funded the loan.
    pub lender_id: AccountHolderId,
    /// Account that received the loan.
    pub borrower_id: AccountHolderId,
    /// Total credited to the borrower.
    pub amount: Money,
    /// Interest rate in percent.
    pub interest_rate: Decimal,
    /// Due date.
    pub due_date: DateTime<Utc>,
}

/// Repayment row to insert, always `Completed`.
#[derive(Debug, Clone)]
pub struct NewRepayment {
    /// Loan being repaid.
    pub loan_id: LoanId,
    /// Account that paid.
    pub payer_id: AccountHolderId,
    /// Repaid amount.
    pub amount: Money,
}

// ========== Engine outputs ==========

/// Result of a repayment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentOutcome {
    /// The recorded repayment.
    pub repayment: Repayment,
    /// Loan status after the repayment.
    pub loan_status: LoanStatus,
    /// Debt left on the loan after the repayment.
    pub remaining_debt: Money,
}

/// Result of reversing a transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReversal {
    /// The original transfer, now reversed.
    pub original: Transfer,
    /// The counter-transfer that undid it.
    pub reversal: Transfer,
}

/// Result of reversing a loan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanReversal {
    /// The loan, now reversed.
    pub loan: Loan,
    /// Principal credited back to the lender.
    pub principal_returned: Money,
}

/// What happened to a deleted account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Deletion {
    /// Holder had ledger history and was only marked deleted.
    SoftDeleted,
    /// Holder had no history and was removed.
    Removed,
}
