//! Postgres implementation of the core ledger store traits.

mod mapping;
mod store;
mod txn;

pub use store::SeaOrmLedgerStore;
pub use txn::SeaOrmLedgerTxn;
