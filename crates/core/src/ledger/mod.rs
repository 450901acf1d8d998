//! Ledger core: account balances and the four entry kinds.
//!
//! This module implements:
//! - Domain types for account holders, deposits, transfers, loans and repayments
//! - Error types for ledger operations
//! - Loan principal/interest arithmetic
//! - Business rule checks
//! - The store interfaces and an in-memory implementation
//! - The transaction engine running create and reverse operations

pub mod engine;
pub mod error;
pub mod loan;
pub mod memory;
pub mod rules;
pub mod store;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::{LedgerPolicy, TransactionEngine};
pub use error::{EntityKind, LedgerError, LedgerResult};
pub use loan::LoanTerms;
pub use memory::MemoryLedgerStore;
pub use store::{LedgerSnapshot, LedgerStore, LedgerTxn};
pub use types::{
    AccountHolder, AccountHolderInput, CreateDepositInput, CreateLoanInput,
    CreateRepaymentInput, CreateTransferInput, Deletion, Deposit, EntryStatus, Loan,
    LoanReversal, LoanStatus, NewDeposit, NewLoan, NewRepayment, NewTransfer, Repayment,
    RepaymentOutcome, Transfer, TransferReversal,
};
