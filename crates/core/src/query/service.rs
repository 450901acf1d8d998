//! Async entry point for reads, loading a fresh snapshot per call.

use std::sync::Arc;

use fundline_shared::types::{AccountHolderId, PageResponse};

use super::feed::{self, TransactionFilter, TransactionView};
use super::scope::ActiveScope;
use super::summary::{self, AccountFilter, AccountStats, AccountSummary, OpenLoan};
use crate::ledger::{LedgerError, LedgerResult, LedgerStore};

/// Read-only queries over the ledger.
#[derive(Clone)]
pub struct LedgerQueryService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerQueryService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Filtered, paginated feed of every entry kind, newest first.
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> LedgerResult<PageResponse<TransactionView>> {
        let snapshot = self.store.snapshot().await?;
        Ok(feed::list_transactions(&snapshot, filter))
    }

    /// Every entry a non-deleted holder takes part in, newest first.
    pub async fn transactions_for_account(
        &self,
        account_id: AccountHolderId,
    ) -> LedgerResult<Vec<TransactionView>> {
        let snapshot = self.store.snapshot().await?;
        if ActiveScope::new(&snapshot.accounts).get(account_id).is_none() {
            return Err(LedgerError::account_not_found(account_id));
        }
        Ok(feed::transactions_for_account(&snapshot, account_id))
    }

    /// Balance and derived totals of a non-deleted holder.
    pub async fn account_summary(&self, account_id: AccountHolderId) -> LedgerResult<AccountSummary> {
        let snapshot = self.store.snapshot().await?;
        let account = ActiveScope::new(&snapshot.accounts)
            .get(account_id)
            .ok_or_else(|| LedgerError::account_not_found(account_id))?;
        summary::summarize(&snapshot, account)
    }

    /// Filtered, paginated holders with summaries, newest first.
    pub async fn list_accounts(
        &self,
        filter: &AccountFilter,
    ) -> LedgerResult<PageResponse<AccountSummary>> {
        let snapshot = self.store.snapshot().await?;
        summary::list_accounts(&snapshot, filter)
    }

    /// Holder counts.
    pub async fn account_stats(&self) -> LedgerResult<AccountStats> {
        let snapshot = self.store.snapshot().await?;
        summary::account_stats(&snapshot)
    }

    /// Loans that can still be repaid.
    pub async fn open_loans(&self) -> LedgerResult<Vec<OpenLoan>> {
        let snapshot = self.store.snapshot().await?;
        Ok(summary::open_loans(&snapshot))
    }
}
