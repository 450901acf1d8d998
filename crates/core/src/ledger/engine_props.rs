//! Property tests: random operation sequences keep money conserved and balances reconciled.

use std::sync::Arc;

use fundline_shared::types::{AccountHolderId, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::*;
use crate::accounts::AccountHolderService;
use crate::notify::NoopNotifier;
use crate::query::summary;

#[derive(Debug, Clone)]
enum Op {
    Deposit { account: usize, cents: i64 },
    Transfer { from: usize, to: usize, cents: i64 },
    Loan { lender: usize, borrower: usize, cents: i64, rate: u8 },
    Repay { loan: usize, payer: usize, cents: i64 },
    ReverseDeposit(usize),
    ReverseTransfer(usize),
    ReverseLoan(usize),
    ReverseRepayment(usize),
}

const ACCOUNTS: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    let account = 0..ACCOUNTS;
    let cents = 1i64..50_000;
    prop_oneof![
        (account.clone(), cents.clone()).prop_map(|(account, cents)| Op::Deposit { account, cents }),
        (account.clone(), account.clone(), cents.clone())
            .prop_map(|(from, to, cents)| Op::Transfer { from, to, cents }),
        (account.clone(), account.clone(), cents.clone(), 0u8..30).prop_map(
            |(lender, borrower, cents, rate)| Op::Loan {
                lender,
                borrower,
                cents,
                rate
            }
        ),
        (0usize..8, account, cents).prop_map(|(loan, payer, cents)| Op::Repay { loan, payer, cents }),
        (0usize..8).prop_map(Op::ReverseDeposit),
        (0usize..8).prop_map(Op::ReverseTransfer),
        (0usize..8).prop_map(Op::ReverseLoan),
        (0usize..8).prop_map(Op::ReverseRepayment),
    ]
}

fn cents(value: i64) -> Money {
    Money::new(Decimal::new(value, 2))
}

/// Applies `ops`, returning the system total expected from successful external flows
/// alongside the final snapshot.
async fn run(ops: Vec<Op>) -> (Money, LedgerSnapshot) {
    let store = Arc::new(MemoryLedgerStore::new());
    let engine = TransactionEngine::new(store.clone(), Arc::new(NoopNotifier));
    let holders = AccountHolderService::new(store.clone(), Arc::new(NoopNotifier));

    let mut ids: Vec<AccountHolderId> = Vec::new();
    for n in 0..ACCOUNTS {
        let account = holders
            .create(AccountHolderInput {
                name: format!("holder-{n}"),
                account_number: format!("ACC-{n}"),
            })
            .await
            .unwrap();
        ids.push(account.id);
    }

    let mut expected = Money::ZERO;
    let mut deposits = Vec::new();
    let mut transfers = Vec::new();
    let mut loans: Vec<Loan> = Vec::new();
    let mut repayments = Vec::new();

    for op in ops {
        match op {
            Op::Deposit { account, cents: c } => {
                let input = CreateDepositInput {
                    user_id: ids[account],
                    amount: cents(c),
                };
                if let Ok(deposit) = engine.create_deposit(input).await {
                    expected += deposit.amount;
                    deposits.push(deposit.id);
                }
            }
            Op::Transfer { from, to, cents: c } => {
                let input = CreateTransferInput {
                    sender_id: ids[from],
                    receiver_id: ids[to],
                    amount: cents(c),
                };
                if let Ok(transfer) = engine.create_transfer(input).await {
                    transfers.push(transfer.id);
                }
            }
            Op::Loan {
                lender,
                borrower,
                cents: c,
                rate,
            } => {
                let input = CreateLoanInput {
                    lender_id: ids[lender],
                    borrower_id: ids[borrower],
                    amount: cents(c),
                    interest_rate: Decimal::from(rate),
                    due_date: None,
                };
                if let Ok(loan) = engine.create_loan(input).await {
                    let principal = cents(c);
                    expected += loan.amount - principal;
                    loans.push(loan);
                }
            }
            Op::Repay {
                loan,
                payer,
                cents: c,
            } => {
                let Some(loan) = loans.get(loan) else { continue };
                let input = CreateRepaymentInput {
                    loan_id: loan.id,
                    payer_id: ids[payer],
                    amount: cents(c),
                };
                if let Ok(outcome) = engine.create_repayment(input).await {
                    repayments.push(outcome.repayment.id);
                }
            }
            Op::ReverseDeposit(n) => {
                let Some(&id) = deposits.get(n) else { continue };
                if let Ok(deposit) = engine.reverse_deposit(id).await {
                    expected -= deposit.amount;
                }
            }
            Op::ReverseTransfer(n) => {
                let Some(&id) = transfers.get(n) else { continue };
                let _ = engine.reverse_transfer(id).await;
            }
            Op::ReverseLoan(n) => {
                let Some(loan) = loans.get(n) else { continue };
                if let Ok(reversal) = engine.reverse_loan(loan.id).await {
                    expected -= reversal.loan.amount - reversal.principal_returned;
                }
            }
            Op::ReverseRepayment(n) => {
                let Some(&id) = repayments.get(n) else { continue };
                let _ = engine.reverse_repayment(id).await;
            }
        }
    }

    (expected, store.snapshot().await.unwrap())
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_money_is_conserved(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (expected, snapshot) = block_on(run(ops));
        let total: Money = snapshot.accounts.iter().map(|a| a.balance).sum();
        prop_assert_eq!(total, expected);
    }

    #[test]
    fn prop_balances_never_negative_and_reconcile(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (_, snapshot) = block_on(run(ops));
        for account in &snapshot.accounts {
            prop_assert!(!account.balance.is_negative());
            prop_assert_eq!(summary::derived_balance(&snapshot, account.id).unwrap(), account.balance);
        }
    }

    #[test]
    fn prop_repayments_never_exceed_loan(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let (_, snapshot) = block_on(run(ops));
        for loan in &snapshot.loans {
            let repaid: Money = snapshot
                .repayments
                .iter()
                .filter(|r| r.loan_id == loan.id && r.status == EntryStatus::Completed)
                .map(|r| r.amount)
                .sum();
            prop_assert!(repaid <= loan.amount);
            if loan.status == LoanStatus::Repaid {
                prop_assert!(snapshot.repayments.iter().any(|r| r.loan_id == loan.id));
            }
        }
    }
}
