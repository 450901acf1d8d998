//! `SeaORM` entities for the ledger tables.

pub mod account_holders;
pub mod deposits;
pub mod loans;
pub mod repayments;
pub mod sea_orm_active_enums;
pub mod transfers;
