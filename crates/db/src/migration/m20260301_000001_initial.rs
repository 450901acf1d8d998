//! Initial schema: account holders and the four entry tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
            DROP TABLE IF EXISTS repayments CASCADE;
            DROP TABLE IF EXISTS loans CASCADE;
            DROP TABLE IF EXISTS transfers CASCADE;
            DROP TABLE IF EXISTS deposits CASCADE;
            DROP TABLE IF EXISTS account_holders CASCADE;
            DROP TYPE IF EXISTS loan_status;
            DROP TYPE IF EXISTS entry_status;
            ",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
CREATE TYPE entry_status AS ENUM ('completed', 'reversed');
CREATE TYPE loan_status AS ENUM ('pending', 'active', 'repaid', 'defaulted', 'reversed');

-- Amounts are unconstrained NUMERIC: loan totals carry the exact interest product
CREATE TABLE account_holders (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    account_number VARCHAR(64) NOT NULL,
    balance NUMERIC NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_balance_non_negative CHECK (balance >= 0)
);

-- Names are unique among live holders only
CREATE UNIQUE INDEX idx_account_holders_name_active
    ON account_holders(name) WHERE deleted_at IS NULL;
CREATE INDEX idx_account_holders_created ON account_holders(created_at DESC);

CREATE TABLE deposits (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES account_holders(id),
    amount NUMERIC NOT NULL,
    status entry_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_deposit_positive CHECK (amount > 0)
);

CREATE INDEX idx_deposits_user ON deposits(user_id);

CREATE TABLE transfers (
    id UUID PRIMARY KEY,
    sender_id UUID NOT NULL REFERENCES account_holders(id),
    receiver_id UUID NOT NULL REFERENCES account_holders(id),
    amount NUMERIC NOT NULL,
    status entry_status NOT NULL DEFAULT 'completed',
    related_transaction_id UUID REFERENCES transfers(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transfer_positive CHECK (amount > 0),
    CONSTRAINT chk_transfer_distinct CHECK (sender_id <> receiver_id)
);

CREATE INDEX idx_transfers_sender ON transfers(sender_id);
CREATE INDEX idx_transfers_receiver ON transfers(receiver_id);

CREATE TABLE loans (
    id UUID PRIMARY KEY,
    lender_id UUID NOT NULL REFERENCES account_holders(id),
    borrower_id UUID NOT NULL REFERENCES account_holders(id),
    amount NUMERIC NOT NULL,
    interest_rate NUMERIC NOT NULL DEFAULT 0,
    due_date TIMESTAMPTZ NOT NULL,
    status loan_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_loan_positive CHECK (amount > 0),
    CONSTRAINT chk_loan_rate CHECK (interest_rate >= 0),
    CONSTRAINT chk_loan_distinct CHECK (lender_id <> borrower_id)
);

CREATE INDEX idx_loans_lender ON loans(lender_id);
CREATE INDEX idx_loans_borrower ON loans(borrower_id, created_at DESC);

CREATE TABLE repayments (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id),
    payer_id UUID NOT NULL REFERENCES account_holders(id),
    amount NUMERIC NOT NULL,
    status entry_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_repayment_positive CHECK (amount > 0)
);

CREATE INDEX idx_repayments_loan ON repayments(loan_id) WHERE status = 'completed';
CREATE INDEX idx_repayments_payer ON repayments(payer_id);
";
