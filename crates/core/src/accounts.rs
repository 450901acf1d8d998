//! Account holder management.
//!
//! Holders start with a zero balance. Deleting a holder that any entry references only
//! sets `deleted_at`, so past entries keep a valid owner.

use std::sync::Arc;

use chrono::Utc;
use fundline_shared::types::AccountHolderId;

use crate::ledger::engine::lock_active;
use crate::ledger::{AccountHolder, AccountHolderInput, Deletion, LedgerError, LedgerResult, LedgerStore};
use crate::notify::{LedgerEvent, Notifier};

/// Creates, renames and deletes account holders.
#[derive(Clone)]
pub struct AccountHolderService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl AccountHolderService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Opens a new account with a zero balance.
    pub async fn create(&self, input: AccountHolderInput) -> LedgerResult<AccountHolder> {
        let input = normalize(input)?;

        let mut txn = self.store.begin().await?;
        if txn
            .find_active_account_by_name(&input.name, None)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateName(
                "Account name is used try another name".to_string(),
            ));
        }
        let account = txn.insert_account(input).await?;
        txn.commit().await?;

        self.notifier.announce(LedgerEvent::AccountHoldersUpdated);
        Ok(account)
    }

    /// Replaces a holder's name and account number.
    pub async fn update(
        &self,
        id: AccountHolderId,
        input: AccountHolderInput,
    ) -> LedgerResult<AccountHolder> {
        let input = normalize(input)?;

        let mut txn = self.store.begin().await?;
        lock_active(txn.as_mut(), id).await?;
        if txn
            .find_active_account_by_name(&input.name, Some(id))
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateName(
                "Name is already used by another account holder".to_string(),
            ));
        }
        let account = txn.update_account(id, input).await?;
        txn.commit().await?;

        self.notifier.announce(LedgerEvent::AccountHoldersUpdated);
        Ok(account)
    }

    /// Deletes a holder: soft when it has ledger history, physically otherwise.
    pub async fn delete(&self, id: AccountHolderId) -> LedgerResult<Deletion> {
        let mut txn = self.store.begin().await?;
        lock_active(txn.as_mut(), id).await?;
        let deletion = if txn.count_account_history(id).await? > 0 {
            txn.soft_delete_account(id, Utc::now()).await?;
            Deletion::SoftDeleted
        } else {
            txn.remove_account(id).await?;
            Deletion::Removed
        };
        txn.commit().await?;

        self.notifier.announce(LedgerEvent::AccountHoldersUpdated);
        Ok(deletion)
    }
}

fn normalize(input: AccountHolderInput) -> LedgerResult<AccountHolderInput> {
    let name = input.name.trim().to_string();
    let account_number = input.account_number.trim().to_string();
    if name.is_empty() {
        return Err(LedgerError::InvalidOperation("Name is required".to_string()));
    }
    if account_number.is_empty() {
        return Err(LedgerError::InvalidOperation(
            "Account Number is required".to_string(),
        ));
    }
    Ok(AccountHolderInput {
        name,
        account_number,
    })
}
