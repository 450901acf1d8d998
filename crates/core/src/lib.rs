//! Core business logic for Fundline.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage and notification are reached through traits the outer crates implement.
//!
//! # Modules
//!
//! - `ledger` - Balance-mutating operations and the store interfaces
//! - `accounts` - Account holder management
//! - `query` - Transaction feed and per-account summaries
//! - `notify` - Post-commit change notifications

pub mod accounts;
pub mod ledger;
pub mod notify;
pub mod query;
