//! In-process [`LedgerStore`] used by tests and the `memory` backend.
//!
//! One async mutex guards the whole state, so every unit is fully serialized. A unit
//! works on a copy of the state taken at `begin` and writes it back on `commit`;
//! dropping the unit discards the copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fundline_shared::types::{
    AccountHolderId, DepositId, LoanId, Money, RepaymentId, TransferId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::{EntityKind, LedgerError, LedgerResult};
use super::store::{LedgerSnapshot, LedgerStore, LedgerTxn};
use super::types::{
    AccountHolder, AccountHolderInput, Deposit, EntryStatus, Loan, LoanStatus, NewDeposit,
    NewLoan, NewRepayment, NewTransfer, Repayment, Transfer,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountHolderId, AccountHolder>,
    deposits: BTreeMap<DepositId, Deposit>,
    transfers: BTreeMap<TransferId, Transfer>,
    loans: BTreeMap<LoanId, Loan>,
    repayments: BTreeMap<RepaymentId, Repayment>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Strictly increasing timestamps keep creation order unambiguous.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }

    fn account_mut(&mut self, id: AccountHolderId) -> LedgerResult<&mut AccountHolder> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))
    }
}

/// Ledger store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTxn { guard, working }))
    }

    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let state = self.state.lock().await;
        let mut accounts: Vec<AccountHolder> = state.accounts.values().cloned().collect();
        accounts.sort_by_key(|account| account.created_at);
        Ok(LedgerSnapshot {
            accounts,
            deposits: state.deposits.values().cloned().collect(),
            transfers: state.transfers.values().cloned().collect(),
            loans: state.loans.values().cloned().collect(),
            repayments: state.repayments.values().cloned().collect(),
        })
    }
}

struct MemoryTxn {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn missing(entity: EntityKind, id: impl Into<uuid::Uuid>) -> LedgerError {
    LedgerError::NotFound {
        entity,
        id: id.into(),
    }
}

#[async_trait]
impl LedgerTxn for MemoryTxn {
    async fn lock_account(&mut self, id: AccountHolderId) -> LedgerResult<Option<AccountHolder>> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn adjust_balance(
        &mut self,
        id: AccountHolderId,
        delta: Money,
    ) -> LedgerResult<AccountHolder> {
        let now = self.working.next_timestamp();
        let account = self.working.account_mut(id)?;
        let balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(LedgerError::out_of_range)?;
        if balance.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                account_id: id.into_inner(),
                available: account.balance,
                required: -delta,
            });
        }
        account.balance = balance;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn find_active_account_by_name(
        &mut self,
        name: &str,
        excluding: Option<AccountHolderId>,
    ) -> LedgerResult<Option<AccountHolder>> {
        Ok(self
            .working
            .accounts
            .values()
            .find(|account| {
                account.is_active() && account.name == name && Some(account.id) != excluding
            })
            .cloned())
    }

    async fn insert_account(&mut self, input: AccountHolderInput) -> LedgerResult<AccountHolder> {
        let now = self.working.next_timestamp();
        let account = AccountHolder {
            id: AccountHolderId::new(),
            name: input.name,
            account_number: input.account_number,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.working.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(
        &mut self,
        id: AccountHolderId,
        input: AccountHolderInput,
    ) -> LedgerResult<AccountHolder> {
        let now = self.working.next_timestamp();
        let account = self.working.account_mut(id)?;
        account.name = input.name;
        account.account_number = input.account_number;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn count_account_history(&mut self, id: AccountHolderId) -> LedgerResult<u64> {
        let state = &self.working;
        let count = state.deposits.values().filter(|d| d.user_id == id).count()
            + state
                .transfers
                .values()
                .filter(|t| t.sender_id == id || t.receiver_id == id)
                .count()
            + state
                .loans
                .values()
                .filter(|l| l.lender_id == id || l.borrower_id == id)
                .count()
            + state.repayments.values().filter(|r| r.payer_id == id).count();
        Ok(count as u64)
    }

    async fn soft_delete_account(
        &mut self,
        id: AccountHolderId,
        at: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let account = self.working.account_mut(id)?;
        account.deleted_at = Some(at);
        account.updated_at = at;
        Ok(())
    }

    async fn remove_account(&mut self, id: AccountHolderId) -> LedgerResult<()> {
        self.working
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    async fn lock_deposit(&mut self, id: DepositId) -> LedgerResult<Option<Deposit>> {
        Ok(self.working.deposits.get(&id).cloned())
    }

    async fn lock_transfer(&mut self, id: TransferId) -> LedgerResult<Option<Transfer>> {
        Ok(self.working.transfers.get(&id).cloned())
    }

    async fn lock_loan(&mut self, id: LoanId) -> LedgerResult<Option<Loan>> {
        Ok(self.working.loans.get(&id).cloned())
    }

    async fn lock_repayment(&mut self, id: RepaymentId) -> LedgerResult<Option<Repayment>> {
        Ok(self.working.repayments.get(&id).cloned())
    }

    async fn insert_deposit(&mut self, row: NewDeposit) -> LedgerResult<Deposit> {
        let deposit = Deposit {
            id: DepositId::new(),
            user_id: row.user_id,
            amount: row.amount,
            status: EntryStatus::Completed,
            created_at: self.working.next_timestamp(),
        };
        self.working.deposits.insert(deposit.id, deposit.clone());
        Ok(deposit)
    }

    async fn insert_transfer(&mut self, row: NewTransfer) -> LedgerResult<Transfer> {
        let transfer = Transfer {
            id: TransferId::new(),
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            amount: row.amount,
            status: EntryStatus::Completed,
            related_transaction_id: row.related_transaction_id,
            created_at: self.working.next_timestamp(),
        };
        self.working.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn insert_loan(&mut self, row: NewLoan) -> LedgerResult<Loan> {
        let loan = Loan {
            id: LoanId::new(),
            lender_id: row.lender_id,
            borrower_id: row.borrower_id,
            amount: row.amount,
            interest_rate: row.interest_rate,
            due_date: row.due_date,
            status: LoanStatus::Pending,
            created_at: self.working.next_timestamp(),
        };
        self.working.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn insert_repayment(&mut self, row: NewRepayment) -> LedgerResult<Repayment> {
        let repayment = Repayment {
            id: RepaymentId::new(),
            loan_id: row.loan_id,
            payer_id: row.payer_id,
            amount: row.amount,
            status: EntryStatus::Completed,
            created_at: self.working.next_timestamp(),
        };
        self.working
            .repayments
            .insert(repayment.id, repayment.clone());
        Ok(repayment)
    }

    async fn set_deposit_status(
        &mut self,
        id: DepositId,
        status: EntryStatus,
    ) -> LedgerResult<Deposit> {
        let deposit = self
            .working
            .deposits
            .get_mut(&id)
            .ok_or_else(|| missing(EntityKind::Deposit, id))?;
        deposit.status = status;
        Ok(deposit.clone())
    }

    async fn set_transfer_status(
        &mut self,
        id: TransferId,
        status: EntryStatus,
        related_transaction_id: Option<TransferId>,
    ) -> LedgerResult<Transfer> {
        let transfer = self
            .working
            .transfers
            .get_mut(&id)
            .ok_or_else(|| missing(EntityKind::Transfer, id))?;
        transfer.status = status;
        transfer.related_transaction_id = related_transaction_id;
        Ok(transfer.clone())
    }

    async fn set_loan_status(&mut self, id: LoanId, status: LoanStatus) -> LedgerResult<Loan> {
        let loan = self
            .working
            .loans
            .get_mut(&id)
            .ok_or_else(|| missing(EntityKind::Loan, id))?;
        loan.status = status;
        Ok(loan.clone())
    }

    async fn set_repayment_status(
        &mut self,
        id: RepaymentId,
        status: EntryStatus,
    ) -> LedgerResult<Repayment> {
        let repayment = self
            .working
            .repayments
            .get_mut(&id)
            .ok_or_else(|| missing(EntityKind::Repayment, id))?;
        repayment.status = status;
        Ok(repayment.clone())
    }

    async fn sum_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<Money> {
        Ok(self
            .working
            .repayments
            .values()
            .filter(|r| r.loan_id == loan_id && r.status == EntryStatus::Completed)
            .map(|r| r.amount)
            .sum())
    }

    async fn count_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<u64> {
        let count = self
            .working
            .repayments
            .values()
            .filter(|r| r.loan_id == loan_id && r.status == EntryStatus::Completed)
            .count();
        Ok(count as u64)
    }

    async fn find_newer_open_loan(
        &mut self,
        borrower_id: AccountHolderId,
        after: DateTime<Utc>,
        excluding: LoanId,
    ) -> LedgerResult<Option<Loan>> {
        Ok(self
            .working
            .loans
            .values()
            .filter(|l| {
                l.borrower_id == borrower_id
                    && l.id != excluding
                    && l.created_at > after
                    && l.status.is_open()
            })
            .max_by_key(|l| l.created_at)
            .cloned())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
