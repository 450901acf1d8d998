//! `SeaORM` Entity for transfers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EntryStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[sea_orm(column_type = "Decimal(None)")]
    pub amount: Decimal,
    pub status: EntryStatus,
    pub related_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account_holders::Entity",
        from = "Column::SenderId",
        to = "super::account_holders::Column::Id"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::account_holders::Entity",
        from = "Column::ReceiverId",
        to = "super::account_holders::Column::Id"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}
