//! One database transaction implementing [`LedgerTxn`].
//!
//! Every `lock_*` issues `SELECT ... FOR UPDATE`, so row locks are held until the
//! wrapped [`DatabaseTransaction`] commits or is dropped. Dropping rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fundline_core::ledger::{
    AccountHolder, AccountHolderInput, Deposit, EntityKind, EntryStatus, LedgerError,
    LedgerResult, LedgerTxn, Loan, LoanStatus, NewDeposit, NewLoan, NewRepayment, NewTransfer,
    Repayment, Transfer,
};
use fundline_shared::types::{
    AccountHolderId, DepositId, LoanId, Money, RepaymentId, TransferId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::mapping::{
    account_from_model, db_err, deposit_from_model, loan_from_model, missing,
    repayment_from_model, transfer_from_model,
};
use crate::entities::{
    account_holders, deposits, loans, repayments, sea_orm_active_enums as db_enums, transfers,
};

/// A ledger unit of work backed by a Postgres transaction.
pub struct SeaOrmLedgerTxn {
    txn: DatabaseTransaction,
}

impl SeaOrmLedgerTxn {
    pub(crate) const fn new(txn: DatabaseTransaction) -> Self {
        Self { txn }
    }

    async fn account_model(&self, id: AccountHolderId) -> LedgerResult<account_holders::Model> {
        account_holders::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| missing(EntityKind::AccountHolder, id))
    }
}

#[async_trait]
impl LedgerTxn for SeaOrmLedgerTxn {
    async fn lock_account(&mut self, id: AccountHolderId) -> LedgerResult<Option<AccountHolder>> {
        let model = account_holders::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(account_from_model))
    }

    async fn adjust_balance(
        &mut self,
        id: AccountHolderId,
        delta: Money,
    ) -> LedgerResult<AccountHolder> {
        let model = self.account_model(id).await?;
        let balance = Money::new(model.balance)
            .checked_add(delta)
            .ok_or_else(LedgerError::out_of_range)?;
        if balance.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                account_id: id.into_inner(),
                available: Money::new(model.balance),
                required: -delta,
            });
        }

        let mut active = model.into_active_model();
        active.balance = Set(balance.amount());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.txn).await.map_err(db_err)?;
        Ok(account_from_model(updated))
    }

    async fn find_active_account_by_name(
        &mut self,
        name: &str,
        excluding: Option<AccountHolderId>,
    ) -> LedgerResult<Option<AccountHolder>> {
        let mut query = account_holders::Entity::find()
            .filter(account_holders::Column::Name.eq(name))
            .filter(account_holders::Column::DeletedAt.is_null());
        if let Some(id) = excluding {
            query = query.filter(account_holders::Column::Id.ne(id.into_inner()));
        }
        let model = query.one(&self.txn).await.map_err(db_err)?;
        Ok(model.map(account_from_model))
    }

    async fn insert_account(&mut self, input: AccountHolderInput) -> LedgerResult<AccountHolder> {
        let now = Utc::now().into();
        let model = account_holders::ActiveModel {
            id: Set(AccountHolderId::new().into_inner()),
            name: Set(input.name),
            account_number: Set(input.account_number),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(account_from_model(model))
    }

    async fn update_account(
        &mut self,
        id: AccountHolderId,
        input: AccountHolderInput,
    ) -> LedgerResult<AccountHolder> {
        let mut active = self.account_model(id).await?.into_active_model();
        active.name = Set(input.name);
        active.account_number = Set(input.account_number);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.txn).await.map_err(db_err)?;
        Ok(account_from_model(updated))
    }

    async fn count_account_history(&mut self, id: AccountHolderId) -> LedgerResult<u64> {
        let id = id.into_inner();
        let deposits = deposits::Entity::find()
            .filter(deposits::Column::UserId.eq(id))
            .count(&self.txn)
            .await
            .map_err(db_err)?;
        let transfers = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::SenderId.eq(id))
                    .add(transfers::Column::ReceiverId.eq(id)),
            )
            .count(&self.txn)
            .await
            .map_err(db_err)?;
        let loans = loans::Entity::find()
            .filter(
                Condition::any()
                    .add(loans::Column::LenderId.eq(id))
                    .add(loans::Column::BorrowerId.eq(id)),
            )
            .count(&self.txn)
            .await
            .map_err(db_err)?;
        let repayments = repayments::Entity::find()
            .filter(repayments::Column::PayerId.eq(id))
            .count(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(deposits + transfers + loans + repayments)
    }

    async fn soft_delete_account(
        &mut self,
        id: AccountHolderId,
        at: DateTime<Utc>,
    ) -> LedgerResult<()> {
        let mut active = self.account_model(id).await?.into_active_model();
        active.deleted_at = Set(Some(at.into()));
        active.updated_at = Set(at.into());
        active.update(&self.txn).await.map_err(db_err)?;
        Ok(())
    }

    async fn remove_account(&mut self, id: AccountHolderId) -> LedgerResult<()> {
        let result = account_holders::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(missing(EntityKind::AccountHolder, id));
        }
        Ok(())
    }

    async fn lock_deposit(&mut self, id: DepositId) -> LedgerResult<Option<Deposit>> {
        let model = deposits::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(deposit_from_model))
    }

    async fn lock_transfer(&mut self, id: TransferId) -> LedgerResult<Option<Transfer>> {
        let model = transfers::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(transfer_from_model))
    }

    async fn lock_loan(&mut self, id: LoanId) -> LedgerResult<Option<Loan>> {
        let model = loans::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(loan_from_model))
    }

    async fn lock_repayment(&mut self, id: RepaymentId) -> LedgerResult<Option<Repayment>> {
        let model = repayments::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(repayment_from_model))
    }

    async fn insert_deposit(&mut self, row: NewDeposit) -> LedgerResult<Deposit> {
        let model = deposits::ActiveModel {
            id: Set(DepositId::new().into_inner()),
            user_id: Set(row.user_id.into_inner()),
            amount: Set(row.amount.amount()),
            status: Set(db_enums::EntryStatus::Completed),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(deposit_from_model(model))
    }

    async fn insert_transfer(&mut self, row: NewTransfer) -> LedgerResult<Transfer> {
        let model = transfers::ActiveModel {
            id: Set(TransferId::new().into_inner()),
            sender_id: Set(row.sender_id.into_inner()),
            receiver_id: Set(row.receiver_id.into_inner()),
            amount: Set(row.amount.amount()),
            status: Set(db_enums::EntryStatus::Completed),
            related_transaction_id: Set(row.related_transaction_id.map(TransferId::into_inner)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(transfer_from_model(model))
    }

    async fn insert_loan(&mut self, row: NewLoan) -> LedgerResult<Loan> {
        let model = loans::ActiveModel {
            id: Set(LoanId::new().into_inner()),
            lender_id: Set(row.lender_id.into_inner()),
            borrower_id: Set(row.borrower_id.into_inner()),
            amount: Set(row.amount.amount()),
            interest_rate: Set(row.interest_rate),
            due_date: Set(row.due_date.into()),
            status: Set(db_enums::LoanStatus::Pending),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(loan_from_model(model))
    }

    async fn insert_repayment(&mut self, row: NewRepayment) -> LedgerResult<Repayment> {
        let model = repayments::ActiveModel {
            id: Set(RepaymentId::new().into_inner()),
            loan_id: Set(row.loan_id.into_inner()),
            payer_id: Set(row.payer_id.into_inner()),
            amount: Set(row.amount.amount()),
            status: Set(db_enums::EntryStatus::Completed),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(repayment_from_model(model))
    }

    async fn set_deposit_status(
        &mut self,
        id: DepositId,
        status: EntryStatus,
    ) -> LedgerResult<Deposit> {
        let model = deposits::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(deposit_from_model(model))
    }

    async fn set_transfer_status(
        &mut self,
        id: TransferId,
        status: EntryStatus,
        related_transaction_id: Option<TransferId>,
    ) -> LedgerResult<Transfer> {
        let model = transfers::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.into()),
            related_transaction_id: Set(related_transaction_id.map(TransferId::into_inner)),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(transfer_from_model(model))
    }

    async fn set_loan_status(&mut self, id: LoanId, status: LoanStatus) -> LedgerResult<Loan> {
        let model = loans::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(loan_from_model(model))
    }

    async fn set_repayment_status(
        &mut self,
        id: RepaymentId,
        status: EntryStatus,
    ) -> LedgerResult<Repayment> {
        let model = repayments::ActiveModel {
            id: Set(id.into_inner()),
            status: Set(status.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(db_err)?;
        Ok(repayment_from_model(model))
    }

    async fn sum_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<Money> {
        let total: Option<Option<Decimal>> = repayments::Entity::find()
            .filter(repayments::Column::LoanId.eq(loan_id.into_inner()))
            .filter(repayments::Column::Status.eq(db_enums::EntryStatus::Completed))
            .select_only()
            .column_as(repayments::Column::Amount.sum(), "total")
            .into_tuple()
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(Money::new(total.flatten().unwrap_or(Decimal::ZERO)))
    }

    async fn count_completed_repayments(&mut self, loan_id: LoanId) -> LedgerResult<u64> {
        repayments::Entity::find()
            .filter(repayments::Column::LoanId.eq(loan_id.into_inner()))
            .filter(repayments::Column::Status.eq(db_enums::EntryStatus::Completed))
            .count(&self.txn)
            .await
            .map_err(db_err)
    }

    async fn find_newer_open_loan(
        &mut self,
        borrower_id: AccountHolderId,
        after: DateTime<Utc>,
        excluding: LoanId,
    ) -> LedgerResult<Option<Loan>> {
        let model = loans::Entity::find()
            .filter(loans::Column::BorrowerId.eq(borrower_id.into_inner()))
            .filter(loans::Column::CreatedAt.gt(after))
            .filter(loans::Column::Id.ne(excluding.into_inner()))
            .filter(
                loans::Column::Status
                    .is_in([db_enums::LoanStatus::Pending, db_enums::LoanStatus::Active]),
            )
            .order_by_desc(loans::Column::CreatedAt)
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(loan_from_model))
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.txn.commit().await.map_err(db_err)
    }
}

