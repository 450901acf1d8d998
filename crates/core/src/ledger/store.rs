//! Store interfaces the engine and query layer run against.
//!
//! A [`LedgerTxn`] is one atomic unit: reads through it see its own writes, rows it
//! locks stay locked until the handle is committed or dropped, and dropping it without
//! [`LedgerTxn::commit`] discards every change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fundline_shared::types::{
    AccountHolderId, DepositId, LoanId, Money, RepaymentId, TransferId,
};

use super::error::LedgerResult;
use super::types::{
    AccountHolder, AccountHolderInput, Deposit, EntryStatus, Loan, LoanStatus, NewDeposit,
    NewLoan, NewRepayment, NewTransfer, Repayment, Transfer,
};

/// Handle to a backing store.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a new atomic unit.
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>>;

    /// Reads every account and entry, outside any write transaction.
    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot>;
}

/// Operations available inside one atomic unit.
#[async_trait]
pub trait LedgerTxn: Send {
    // ========== Account holders ==========

    /// Loads an account holder and locks its row until the unit ends.
    ///
    /// Soft-deleted holders are returned as-is; callers decide how to treat them.
    async fn lock_account(&mut self, id: AccountHolderId) -> LedgerResult<Option<AccountHolder>>;

    /// Adds `delta` (possibly negative) to a locked account's balance.
    async fn adjust_balance(
        &mut self,
        id: AccountHolderId,
        delta: Money,
    ) -> LedgerResult<AccountHolder>;

    /// Finds a non-deleted holder by exact name, ignoring `excluding`.
    async fn find_active_account_by_name(
        &mut self,
        name: &str,
        excluding: Option<AccountHolderId>,
    ) -> LedgerResult<Option<AccountHolder>>;

    /// Inserts a holder with a zero balance.
    async fn insert_account(&mut self, input: AccountHolderInput) -> LedgerResult<AccountHolder>;

    /// Replaces a holder's name and account number.
    async fn update_account(
        &mut self,
        id: AccountHolderId,
        input: AccountHolderInput,
    ) -> LedgerResult<AccountHolder>;

    /// Counts ledger entries of any kind and status that reference the holder.
    async fn count_account_history(&mut self, id: AccountHolderId) -> LedgerResult<u64>;

    /// Marks a holder deleted without removing it.
    async fn soft_delete_account(
        &mut self,
        id: AccountHolderId,
        at: DateTime<Utc>,
    ) -> LedgerResult<()>;

    /// Physically removes a holder with no history.
    async fn remove_account(&mut self, id: AccountHolderId) -> LedgerResult<()>;

    // ========== Entries ==========

    /// Loads and locks a deposit.
    async fn lock_deposit(&mut self, id: DepositId) -> LedgerResult<Option<Deposit>>;

    /// Loads and locks a transfer.
    async fn lock_transfer(&mut self, id: TransferId) -> LedgerResult<Option<Transfer>>;

    /// Loads and locks a loan.
    async fn lock_loan(&mut self, id: LoanId) -> LedgerResult<Option<Loan>>;

    /// Loads and locks a repayment.
    async fn lock_repayment(&mut self, id: RepaymentId) -> LedgerResult<Option<Repayment>>;

    /// Appends a completed deposit.
    async fn insert_deposit(&mut self, row: NewDeposit) -> LedgerResult<Deposit>;

    /// Appends a completed transfer.
    async fn insert_transfer(&mut self, row: NewTransfer) -> LedgerResult<Transfer>;

    /// Appends a pending loan.
    async fn insert_loan(&mut self, row: NewLoan) -> LedgerResult<Loan>;

    /// Appends a completed repayment.
    async fn insert_repayment(&mut self, row: NewRepayment) -> LedgerResult<Repayment>;

    /// Sets a deposit's status.
    async fn set_deposit_status(
        &mut self,
        id: DepositId,
        status: EntryStatus,
    ) -> LedgerResult<Deposit>;

    /// Sets a transfer's status and reversal link.
    async fn set_transfer_status(
        &mut self,
        id: TransferId,
        status: EntryStatus,
        related_transaction_id: Option<TransferId>,
    ) -> LedgerResult<Transfer>;

    /// Sets a loan's status.
    async fn set_loan_status(&mut self, id: LoanId, status: LoanStatus) -> LedgerResult<Loan>;

    /// Sets a repayment's status.
    async fn set_repayment_status(
        &mut self,
        id: RepaymentId,
        status: EntryStatus,
    ) -> LedgerResult<Repayment>;

    /// Sums the completed repayments of a loan.
    async fn sum_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<Money>;

    /// Counts the completed repayments of a loan.
    async fn count_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<u64>;

    /// Finds an open loan of `borrower_id` created after `after`, other than `excluding`.
    async fn find_newer_open_loan(
        &mut self,
        borrower_id: AccountHolderId,
        after: DateTime<Utc>,
        excluding: LoanId,
    ) -> LedgerResult<Option<Loan>>;

    /// Makes every change of this unit durable.
    async fn commit(self: Box<Self>) -> LedgerResult<()>;
}

/// Every account holder and entry at one point in time, each ordered by creation.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Account holders, including soft-deleted ones.
    pub accounts: Vec<AccountHolder>,
    /// Deposits.
    pub deposits: Vec<Deposit>,
    /// Transfers, including reversal counter-transfers.
    pub transfers: Vec<Transfer>,
    /// Loans.
    pub loans: Vec<Loan>,
    /// Repayments.
    pub repayments: Vec<Repayment>,
}
