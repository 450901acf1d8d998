//! The single "not soft-deleted" predicate used by every read.

use std::collections::HashMap;

use fundline_shared::types::AccountHolderId;

use crate::ledger::AccountHolder;

/// Non-deleted account holders of a snapshot, by id.
#[derive(Debug, Clone)]
pub struct ActiveScope<'a> {
    accounts: HashMap<AccountHolderId, &'a AccountHolder>,
}

impl<'a> ActiveScope<'a> {
    /// Builds the scope from all holders, dropping soft-deleted ones.
    #[must_use]
    pub fn new(accounts: &'a [AccountHolder]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .filter(|account| account.is_active())
                .map(|account| (account.id, account))
                .collect(),
        }
    }

    /// Returns the holder if it exists and is not deleted.
    #[must_use]
    pub fn get(&self, id: AccountHolderId) -> Option<&'a AccountHolder> {
        self.accounts.get(&id).copied()
    }

    /// Returns the holder's name if it exists and is not deleted.
    #[must_use]
    pub fn name(&self, id: AccountHolderId) -> Option<&'a str> {
        self.get(id).map(|account| account.name.as_str())
    }

    /// Returns true if every id is a non-deleted holder.
    #[must_use]
    pub fn contains_all(&self, ids: &[AccountHolderId]) -> bool {
        ids.iter().all(|id| self.accounts.contains_key(id))
    }

    /// Iterates the non-deleted holders in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = &'a AccountHolder> + '_ {
        self.accounts.values().copied()
    }
}
