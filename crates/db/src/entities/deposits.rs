//! `SeaORM` Entity for deposits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EntryStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "deposits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(None)")]
    pub amount: Decimal,
    pub status: EntryStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_holders::Entity",
        from = "Column::UserId",
        to = "super::account_holders::Column::Id"
    )]
    AccountHolders,
}

impl Related<super::account_holders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountHolders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
