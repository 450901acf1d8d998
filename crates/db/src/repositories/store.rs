//! [`LedgerStore`] over a pooled Postgres connection.

use async_trait::async_trait;
use fundline_core::ledger::{LedgerResult, LedgerSnapshot, LedgerStore, LedgerTxn};
use sea_orm::{
    AccessMode, DatabaseConnection, EntityTrait, IsolationLevel, QueryOrder, TransactionTrait,
};

use super::mapping::{
    account_from_model, db_err, deposit_from_model, loan_from_model, repayment_from_model,
    transfer_from_model,
};
use super::txn::SeaOrmLedgerTxn;
use crate::entities::{account_holders, deposits, loans, repayments, transfers};

/// Ledger store backed by Postgres.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
}

impl SeaOrmLedgerStore {
    /// Creates a new store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for SeaOrmLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTxn>> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmLedgerTxn::new(txn)))
    }

    async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        // One repeatable-read transaction so all five tables agree.
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(db_err)?;

        let accounts = account_holders::Entity::find()
            .order_by_asc(account_holders::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;
        let deposits = deposits::Entity::find()
            .order_by_asc(deposits::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;
        let transfers = transfers::Entity::find()
            .order_by_asc(transfers::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;
        let loans = loans::Entity::find()
            .order_by_asc(loans::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;
        let repayments = repayments::Entity::find()
            .order_by_asc(repayments::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok(LedgerSnapshot {
            accounts: accounts.into_iter().map(account_from_model).collect(),
            deposits: deposits.into_iter().map(deposit_from_model).collect(),
            transfers: transfers.into_iter().map(transfer_from_model).collect(),
            loans: loans.into_iter().map(loan_from_model).collect(),
            repayments: repayments.into_iter().map(repayment_from_model).collect(),
        })
    }
}
