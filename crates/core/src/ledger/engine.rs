//! Transaction engine: the balance-mutating create and reverse operations.
//!
//! Every operation runs inside one [`LedgerTxn`]. Entry rows are locked before account
//! rows, and two accounts are always locked in ascending id order. Any error returns
//! before `commit`, which drops the handle and rolls everything back. The notifier is
//! called only after a successful commit.

use std::sync::Arc;

use chrono::Utc;
use fundline_shared::config::LedgerConfig;
use fundline_shared::types::{AccountHolderId, DepositId, LoanId, RepaymentId, TransferId};

use super::error::{EntityKind, LedgerError, LedgerResult};
use super::loan::LoanTerms;
use super::rules;
use super::store::{LedgerStore, LedgerTxn};
use super::types::{
    AccountHolder, CreateDepositInput, CreateLoanInput, CreateRepaymentInput,
    CreateTransferInput, Deposit, EntryStatus, Loan, LoanReversal, LoanStatus, NewDeposit,
    NewLoan, NewRepayment, NewTransfer, Repayment, RepaymentOutcome, Transfer,
    TransferReversal,
};
use crate::notify::{LedgerEvent, Notifier};

/// Business policy switches for the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Reject repaying a loan while the borrower holds a newer open loan.
    pub enforce_latest_loan_first: bool,
}

impl From<LedgerConfig> for LedgerPolicy {
    fn from(config: LedgerConfig) -> Self {
        Self {
            enforce_latest_loan_first: config.enforce_latest_loan_first,
        }
    }
}

/// Runs ledger mutations against an injected store and notifier.
#[derive(Clone)]
pub struct TransactionEngine {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
    policy: LedgerPolicy,
}

impl TransactionEngine {
    /// Creates an engine with the default policy.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            policy: LedgerPolicy::default(),
        }
    }

    /// Replaces the engine's policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: LedgerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// Credits an account with money from outside the ledger.
    pub async fn create_deposit(&self, input: CreateDepositInput) -> LedgerResult<Deposit> {
        rules::ensure_positive(input.amount)?;

        let mut txn = self.store.begin().await?;
        lock_active(txn.as_mut(), input.user_id).await?;
        txn.adjust_balance(input.user_id, input.amount).await?;
        let deposit = txn
            .insert_deposit(NewDeposit {
                user_id: input.user_id,
                amount: input.amount,
            })
            .await?;
        txn.commit().await?;

        self.announce();
        Ok(deposit)
    }

    /// Moves money from one account to another.
    pub async fn create_transfer(&self, input: CreateTransferInput) -> LedgerResult<Transfer> {
        rules::ensure_positive(input.amount)?;
        if input.sender_id == input.receiver_id {
            return Err(LedgerError::InvalidOperation(
                "Sender and receiver cannot be the same account".to_string(),
            ));
        }

        let mut txn = self.store.begin().await?;
        let (sender, _receiver) = lock_pair(txn.as_mut(), input.sender_id, input.receiver_id).await?;
        rules::ensure_sufficient_funds(&sender, input.amount)?;

        txn.adjust_balance(input.sender_id, -input.amount).await?;
        txn.adjust_balance(input.receiver_id, input.amount).await?;
        let transfer = txn
            .insert_transfer(NewTransfer {
                sender_id: input.sender_id,
                receiver_id: input.receiver_id,
                amount: input.amount,
                related_transaction_id: None,
            })
            .await?;
        txn.commit().await?;

        self.announce();
        Ok(transfer)
    }

    /// Lends `amount` from lender to borrower; the borrower receives principal plus interest.
    pub async fn create_loan(&self, input: CreateLoanInput) -> LedgerResult<Loan> {
        rules::ensure_positive(input.amount)?;
        if input.lender_id == input.borrower_id {
            return Err(LedgerError::InvalidOperation(
                "Lender and borrower cannot be the same account".to_string(),
            ));
        }
        let terms = LoanTerms::from_principal(input.amount, input.interest_rate)?;

        let mut txn = self.store.begin().await?;
        let (lender, _borrower) = lock_pair(txn.as_mut(), input.lender_id, input.borrower_id).await?;
        rules::ensure_sufficient_funds(&lender, terms.principal)?;

        txn.adjust_balance(input.lender_id, -terms.principal).await?;
        txn.adjust_balance(input.borrower_id, terms.total).await?;
        let loan = txn
            .insert_loan(NewLoan {
                lender_id: input.lender_id,
                borrower_id: input.borrower_id,
                amount: terms.total,
                interest_rate: input.interest_rate,
                due_date: input.due_date.unwrap_or_else(Utc::now),
            })
            .await?;
        txn.commit().await?;

        self.announce();
        Ok(loan)
    }

    /// Pays part or all of a loan back to its lender.
    ///
    /// The loan becomes `Repaid` once completed repayments reach its amount.
    pub async fn create_repayment(
        &self,
        input: CreateRepaymentInput,
    ) -> LedgerResult<RepaymentOutcome> {
        rules::ensure_positive(input.amount)?;

        let mut txn = self.store.begin().await?;
        let loan = txn
            .lock_loan(input.loan_id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Loan,
                id: input.loan_id.into_inner(),
            })?;
        if input.payer_id == loan.lender_id {
            return Err(LedgerError::InvalidOperation(
                "A lender cannot repay their own loan".to_string(),
            ));
        }
        let (payer, _lender) = lock_pair(txn.as_mut(), input.payer_id, loan.lender_id).await?;

        rules::ensure_loan_accepts_repayment(&loan)?;
        rules::ensure_sufficient_funds(&payer, input.amount)?;
        let repaid = txn.sum_completed_repayments(loan.id).await?;
        let remaining = rules::check_remaining_debt(&loan, repaid, input.amount)?;

        if self.policy.enforce_latest_loan_first && input.payer_id == loan.borrower_id {
            let newer = txn
                .find_newer_open_loan(loan.borrower_id, loan.created_at, loan.id)
                .await?;
            if newer.is_some() {
                return Err(LedgerError::InvalidState(
                    "You have already taken another active loan. Repay the current active loan instead."
                        .to_string(),
                ));
            }
        }

        txn.adjust_balance(input.payer_id, -input.amount).await?;
        txn.adjust_balance(loan.lender_id, input.amount).await?;
        let repayment = txn
            .insert_repayment(NewRepayment {
                loan_id: loan.id,
                payer_id: input.payer_id,
                amount: input.amount,
            })
            .await?;

        let remaining_debt = remaining - input.amount;
        let loan_status = if remaining_debt.is_positive() {
            loan.status
        } else {
            txn.set_loan_status(loan.id, LoanStatus::Repaid).await?.status
        };
        txn.commit().await?;

        self.announce();
        Ok(RepaymentOutcome {
            repayment,
            loan_status,
            remaining_debt,
        })
    }

    /// Claws a deposit back out of its account.
    pub async fn reverse_deposit(&self, id: DepositId) -> LedgerResult<Deposit> {
        let mut txn = self.store.begin().await?;
        let deposit = txn.lock_deposit(id).await?.ok_or(LedgerError::NotFound {
            entity: EntityKind::Deposit,
            id: id.into_inner(),
        })?;
        rules::ensure_not_reversed(deposit.status, EntityKind::Deposit, id)?;

        let account = lock_active(txn.as_mut(), deposit.user_id).await?;
        rules::ensure_sufficient_funds(&account, deposit.amount)?;

        txn.adjust_balance(deposit.user_id, -deposit.amount).await?;
        let deposit = txn.set_deposit_status(id, EntryStatus::Reversed).await?;
        txn.commit().await?;

        self.announce();
        Ok(deposit)
    }

    /// Undoes a transfer by recording the opposite transfer and linking the two.
    pub async fn reverse_transfer(&self, id: TransferId) -> LedgerResult<TransferReversal> {
        let mut txn = self.store.begin().await?;
        let original = txn.lock_transfer(id).await?.ok_or(LedgerError::NotFound {
            entity: EntityKind::Transfer,
            id: id.into_inner(),
        })?;
        rules::ensure_not_reversed(original.status, EntityKind::Transfer, id)?;
        // A counter-transfer's link must keep pointing at the transfer it undid.
        if original.related_transaction_id.is_some() {
            return Err(LedgerError::InvalidState(
                "A reversal transfer cannot itself be reversed".to_string(),
            ));
        }

        let (_sender, receiver) =
            lock_pair(txn.as_mut(), original.sender_id, original.receiver_id).await?;
        rules::ensure_sufficient_funds(&receiver, original.amount)?;

        txn.adjust_balance(original.sender_id, original.amount).await?;
        txn.adjust_balance(original.receiver_id, -original.amount).await?;
        let reversal = txn
            .insert_transfer(NewTransfer {
                sender_id: original.receiver_id,
                receiver_id: original.sender_id,
                amount: original.amount,
                related_transaction_id: Some(original.id),
            })
            .await?;
        let original = txn
            .set_transfer_status(id, EntryStatus::Reversed, Some(reversal.id))
            .await?;
        txn.commit().await?;

        self.announce();
        Ok(TransferReversal { original, reversal })
    }

    /// Cancels a pending loan with no repayments.
    ///
    /// The lender gets the principal back; the borrower returns the full total.
    pub async fn reverse_loan(&self, id: LoanId) -> LedgerResult<LoanReversal> {
        let mut txn = self.store.begin().await?;
        let loan = txn.lock_loan(id).await?.ok_or(LedgerError::NotFound {
            entity: EntityKind::Loan,
            id: id.into_inner(),
        })?;
        let repayments = txn.count_completed_repayments(id).await?;
        rules::ensure_loan_reversible(&loan, repayments)?;
        let terms = LoanTerms::from_total(loan.amount, loan.interest_rate)?;

        let (_lender, borrower) = lock_pair(txn.as_mut(), loan.lender_id, loan.borrower_id).await?;
        rules::ensure_sufficient_funds(&borrower, terms.total)?;

        txn.adjust_balance(loan.lender_id, terms.principal).await?;
        txn.adjust_balance(loan.borrower_id, -terms.total).await?;
        let loan = txn.set_loan_status(id, LoanStatus::Reversed).await?;
        txn.commit().await?;

        self.announce();
        Ok(LoanReversal {
            loan,
            principal_returned: terms.principal,
        })
    }

    /// Returns a repayment's money from the lender to the payer.
    ///
    /// The loan's status is left untouched.
    pub async fn reverse_repayment(&self, id: RepaymentId) -> LedgerResult<Repayment> {
        let mut txn = self.store.begin().await?;
        let repayment = txn.lock_repayment(id).await?.ok_or(LedgerError::NotFound {
            entity: EntityKind::Repayment,
            id: id.into_inner(),
        })?;
        rules::ensure_not_reversed(repayment.status, EntityKind::Repayment, id)?;
        let loan = txn
            .lock_loan(repayment.loan_id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Loan,
                id: repayment.loan_id.into_inner(),
            })?;

        let (_payer, lender) = lock_pair(txn.as_mut(), repayment.payer_id, loan.lender_id).await?;
        rules::ensure_sufficient_funds(&lender, repayment.amount)?;

        txn.adjust_balance(repayment.payer_id, repayment.amount).await?;
        txn.adjust_balance(loan.lender_id, -repayment.amount).await?;
        let repayment = txn.set_repayment_status(id, EntryStatus::Reversed).await?;
        txn.commit().await?;

        self.announce();
        Ok(repayment)
    }

    fn announce(&self) {
        self.notifier.announce(LedgerEvent::AccountTransactionUpdated);
    }
}

/// Locks one account, treating soft-deleted holders as missing.
pub(crate) async fn lock_active(
    txn: &mut dyn LedgerTxn,
    id: AccountHolderId,
) -> LedgerResult<AccountHolder> {
    match txn.lock_account(id).await? {
        Some(account) if account.is_active() => Ok(account),
        _ => Err(LedgerError::account_not_found(id)),
    }
}

/// Locks two distinct accounts in ascending id order, returning them in argument order.
async fn lock_pair(
    txn: &mut dyn LedgerTxn,
    first: AccountHolderId,
    second: AccountHolderId,
) -> LedgerResult<(AccountHolder, AccountHolder)> {
    if first < second {
        let a = lock_active(txn, first).await?;
        let b = lock_active(txn, second).await?;
        Ok((a, b))
    } else {
        let b = lock_active(txn, second).await?;
        let a = lock_active(txn, first).await?;
        Ok((a, b))
    }
}
