//! Property-based tests for the transaction feed.
//!
//! - Repeated reads with no writes in between are identical
//! - Pages partition the filtered feed without gaps or overlap

use std::sync::Arc;

use fundline_shared::types::{Money, PageRequest};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::feed::{TransactionFilter, TransactionKind, list_transactions};
use crate::ledger::{
    AccountHolderInput, CreateDepositInput, CreateTransferInput, LedgerStore, MemoryLedgerStore,
    TransactionEngine,
};
use crate::accounts::AccountHolderService;
use crate::notify::NoopNotifier;

/// Strategy to generate positive amounts (0.01 to 500.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..50_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn kind_filter() -> impl Strategy<Value = Option<TransactionKind>> {
    prop_oneof![
        Just(None),
        Just(Some(TransactionKind::Deposit)),
        Just(Some(TransactionKind::Transfer)),
    ]
}

/// Builds a ledger with two holders, a deposit each, and a few transfers.
fn populated_store(deposits: &[Decimal], transfers: &[Decimal]) -> MemoryLedgerStore {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let store = MemoryLedgerStore::new();
        let shared: Arc<dyn LedgerStore> = Arc::new(store.clone());
        let accounts = AccountHolderService::new(shared.clone(), Arc::new(NoopNotifier));
        let engine = TransactionEngine::new(shared, Arc::new(NoopNotifier));

        let alice = accounts
            .create(AccountHolderInput {
                name: "Alice".to_string(),
                account_number: "A-1".to_string(),
            })
            .await
            .unwrap();
        let bob = accounts
            .create(AccountHolderInput {
                name: "Bob".to_string(),
                account_number: "B-1".to_string(),
            })
            .await
            .unwrap();

        for amount in deposits {
            engine
                .create_deposit(CreateDepositInput {
                    user_id: alice.id,
                    amount: Money::new(*amount),
                })
                .await
                .unwrap();
        }
        for amount in transfers {
            // Transfers beyond Alice's balance fail and leave no trace.
            let _ = engine
                .create_transfer(CreateTransferInput {
                    sender_id: alice.id,
                    receiver_id: bob.id,
                    amount: Money::new(*amount),
                })
                .await;
        }
        store
    })
}

fn snapshot_of(store: &MemoryLedgerStore) -> crate::ledger::LedgerSnapshot {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(store.snapshot())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_repeated_reads_are_identical(
        deposits in prop::collection::vec(positive_amount(), 1..5),
        transfers in prop::collection::vec(positive_amount(), 0..6),
        kind in kind_filter(),
        page in 1u32..4,
        limit in 1u32..5,
    ) {
        let store = populated_store(&deposits, &transfers);
        let filter = TransactionFilter {
            kind,
            page: PageRequest { page, limit },
            ..TransactionFilter::default()
        };

        let first = list_transactions(&snapshot_of(&store), &filter);
        let second = list_transactions(&snapshot_of(&store), &filter);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_pages_partition_the_feed(
        deposits in prop::collection::vec(positive_amount(), 1..6),
        transfers in prop::collection::vec(positive_amount(), 0..6),
        limit in 1u32..4,
    ) {
        let store = populated_store(&deposits, &transfers);
        let snapshot = snapshot_of(&store);
        let everything = list_transactions(
            &snapshot,
            &TransactionFilter {
                page: PageRequest { page: 1, limit: u32::MAX },
                ..TransactionFilter::default()
            },
        );

        let mut collected = Vec::new();
        let mut page = 1;
        loop {
            let chunk = list_transactions(
                &snapshot,
                &TransactionFilter {
                    page: PageRequest { page, limit },
                    ..TransactionFilter::default()
                },
            );
            prop_assert_eq!(chunk.total, everything.total);
            if chunk.data.is_empty() {
                break;
            }
            collected.extend(chunk.data);
            page += 1;
        }
        prop_assert_eq!(collected, everything.data);
    }
}
