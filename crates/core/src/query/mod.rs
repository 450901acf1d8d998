//! Read side: the unified transaction feed and per-account summaries.
//!
//! Everything here works on a [`LedgerSnapshot`](crate::ledger::LedgerSnapshot) and
//! recomputes aggregates on every call. Soft-deleted holders are filtered through
//! [`ActiveScope`] only.

pub mod feed;
pub mod scope;
pub mod service;
pub mod summary;

#[cfg(test)]
mod feed_props;

pub use feed::{TransactionFilter, TransactionKind, TransactionView};
pub use scope::ActiveScope;
pub use service::LedgerQueryService;
pub use summary::{AccountFilter, AccountStats, AccountSummary, OpenLoan};
