//! Development data seeder for Fundline.
//!
//! Creates a few account holders and runs a deposit, transfer, loan and repayment
//! through the transaction engine, so balances and history stay consistent.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundline_core::accounts::AccountHolderService;
use fundline_core::ledger::{
    AccountHolderInput, CreateDepositInput, CreateLoanInput, CreateRepaymentInput,
    CreateTransferInput, LedgerError, TransactionEngine,
};
use fundline_core::notify::NoopNotifier;
use fundline_db::SeaOrmLedgerStore;
use fundline_shared::AppConfig;
use fundline_shared::types::{AccountHolderId, Money};

const HOLDERS: [(&str, &str); 3] = [
    ("Abebe Kebede", "1000123456"),
    ("Sara Tesfaye", "1000654321"),
    ("Dawit Alemu", "1000777888"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info,fundline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let db = fundline_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(SeaOrmLedgerStore::new(db));
    let accounts = AccountHolderService::new(store.clone(), Arc::new(NoopNotifier));
    let engine = TransactionEngine::new(store, Arc::new(NoopNotifier));

    info!("Seeding account holders...");
    let mut ids: Vec<AccountHolderId> = Vec::with_capacity(HOLDERS.len());
    for (name, account_number) in HOLDERS {
        let input = AccountHolderInput {
            name: name.to_string(),
            account_number: account_number.to_string(),
        };
        match accounts.create(input).await {
            Ok(account) => ids.push(account.id),
            Err(LedgerError::DuplicateName(_)) => {
                info!("Account holders already seeded, skipping...");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }
    let [abebe, sara, dawit] = [ids[0], ids[1], ids[2]];

    info!("Seeding deposits...");
    for (id, amount) in [(abebe, 5000), (sara, 2500), (dawit, 800)] {
        engine
            .create_deposit(CreateDepositInput {
                user_id: id,
                amount: money(amount),
            })
            .await?;
    }

    info!("Seeding transfer...");
    engine
        .create_transfer(CreateTransferInput {
            sender_id: abebe,
            receiver_id: sara,
            amount: money(750),
        })
        .await?;

    info!("Seeding loan and repayment...");
    let loan = engine
        .create_loan(CreateLoanInput {
            lender_id: sara,
            borrower_id: dawit,
            amount: money(1000),
            interest_rate: Decimal::from(10),
            due_date: Some(Utc::now() + Duration::days(30)),
        })
        .await?;
    let outcome = engine
        .create_repayment(CreateRepaymentInput {
            loan_id: loan.id,
            payer_id: dawit,
            amount: money(400),
        })
        .await?;
    info!(
        loan_id = %loan.id,
        remaining = %outcome.remaining_debt.to_fixed(),
        "Loan partially repaid"
    );

    info!("Seeding complete!");
    Ok(())
}

fn money(units: i64) -> Money {
    Money::new(Decimal::from(units))
}
