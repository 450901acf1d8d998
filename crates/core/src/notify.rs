//! Post-commit change notifications.

use serde::Serialize;

/// Something changed that subscribers may want to refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEvent {
    /// A ledger entry was created or reversed.
    AccountTransactionUpdated,
    /// An account holder was created, updated or deleted.
    AccountHoldersUpdated,
}

impl LedgerEvent {
    /// Returns the event name subscribers listen for.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AccountTransactionUpdated => "accountTransactionUpdated",
            Self::AccountHoldersUpdated => "accountHoldersUpdated",
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fire-and-forget announcer, called only after a successful commit.
///
/// Implementations must not block and must swallow delivery failures.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Announces an event to whoever is listening.
    fn announce(&self, event: LedgerEvent);
}

/// Notifier that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn announce(&self, _event: LedgerEvent) {}
}
