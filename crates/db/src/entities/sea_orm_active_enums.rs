//! Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `entry_status` enum shared by deposits, transfers and repayments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    /// Applied to balances.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Undone.
    #[sea_orm(string_value = "reversed")]
    Reversed,
}

/// `loan_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
pub enum LoanStatus {
    /// Open, accepting repayments.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Open, accepting repayments.
    #[sea_orm(string_value = "active")]
    Active,
    /// Fully repaid.
    #[sea_orm(string_value = "repaid")]
    Repaid,
    /// Written off.
    #[sea_orm(string_value = "defaulted")]
    Defaulted,
    /// Cancelled.
    #[sea_orm(string_value = "reversed")]
    Reversed,
}
