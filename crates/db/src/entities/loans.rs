//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LoanStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lender_id: Uuid,
    pub borrower_id: Uuid,
    /// Principal plus interest.
    #[sea_orm(column_type = "Decimal(None)")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(None)")]
    pub interest_rate: Decimal,
    pub due_date: DateTimeWithTimeZone,
    pub status: LoanStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_holders::Entity",
        from = "Column::LenderId",
        to = "super::account_holders::Column::Id"
    )]
    Lender,
    #[sea_orm(
        belongs_to = "super::account_holders::Entity",
        from = "Column::BorrowerId",
        to = "super::account_holders::Column::Id"
    )]
    Borrower,
    #[sea_orm(has_many = "super::repayments::Entity")]
    Repayments,
}

impl Related<super::repayments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
