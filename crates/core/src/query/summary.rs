//! Per-account financial summaries, computed from entries at read time.
//!
//! Reversed deposits, loans and repayments count for nothing. Transfers always count:
//! a reversal is itself a completed counter-transfer, so the original and its reversal
//! cancel out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fundline_shared::types::{AccountHolderId, Money, PageRequest, PageResponse};
use serde::Serialize;

use super::feed::{completed_repayments_by_loan, contains_ci};
use super::scope::ActiveScope;
use crate::ledger::{
    AccountHolder, EntryStatus, LedgerResult, LedgerSnapshot, Loan, LoanStatus, LoanTerms,
};

/// Per-account sums over the entries that still affect balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AccountTotals {
    deposits: Money,
    transfers_in: Money,
    transfers_out: Money,
    loans_taken: Money,
    loans_given: Money,
    repaid_on_loans_taken: Money,
    repayments_made: Money,
    repayments_received: Money,
}

fn ledger_totals(snapshot: &LedgerSnapshot) -> LedgerResult<HashMap<AccountHolderId, AccountTotals>> {
    let mut totals: HashMap<AccountHolderId, AccountTotals> = HashMap::new();

    for deposit in snapshot
        .deposits
        .iter()
        .filter(|d| d.status == EntryStatus::Completed)
    {
        totals.entry(deposit.user_id).or_default().deposits += deposit.amount;
    }

    for transfer in &snapshot.transfers {
        totals.entry(transfer.sender_id).or_default().transfers_out += transfer.amount;
        totals.entry(transfer.receiver_id).or_default().transfers_in += transfer.amount;
    }

    let live_loans: HashMap<_, &Loan> = snapshot
        .loans
        .iter()
        .filter(|l| l.status != LoanStatus::Reversed)
        .map(|l| (l.id, l))
        .collect();
    for loan in live_loans.values() {
        let principal = LoanTerms::from_total(loan.amount, loan.interest_rate)?.principal;
        totals.entry(loan.borrower_id).or_default().loans_taken += loan.amount;
        totals.entry(loan.lender_id).or_default().loans_given += principal;
    }

    for repayment in snapshot
        .repayments
        .iter()
        .filter(|r| r.status == EntryStatus::Completed)
    {
        totals.entry(repayment.payer_id).or_default().repayments_made += repayment.amount;
        if let Some(loan) = live_loans.get(&repayment.loan_id) {
            totals.entry(loan.lender_id).or_default().repayments_received += repayment.amount;
            totals
                .entry(loan.borrower_id)
                .or_default()
                .repaid_on_loans_taken += repayment.amount;
        }
    }

    Ok(totals)
}

/// An account holder with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Holder id.
    pub id: AccountHolderId,
    /// Holder name.
    pub name: String,
    /// External account number.
    pub account_number: String,
    /// Current stored balance.
    pub balance: Money,
    /// Completed deposits.
    pub deposits_amount: Money,
    /// Totals of non-reversed loans taken as borrower.
    pub total_loan_taken: Money,
    /// Completed repayments made on those loans, by anyone.
    pub total_repaid_on_loans: Money,
    /// `total_loan_taken - total_repaid_on_loans`.
    pub outstanding_debt: Money,
    /// Transfers received.
    pub transfers_in_amount: Money,
    /// Transfers sent.
    pub transfers_out_amount: Money,
    /// Completed repayments made as payer.
    pub repayments_amount: Money,
    /// When the holder was created.
    pub created_at: DateTime<Utc>,
}

impl AccountSummary {
    fn new(account: &AccountHolder, totals: AccountTotals) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            account_number: account.account_number.clone(),
            balance: account.balance,
            deposits_amount: totals.deposits,
            total_loan_taken: totals.loans_taken,
            total_repaid_on_loans: totals.repaid_on_loans_taken,
            outstanding_debt: totals.loans_taken - totals.repaid_on_loans_taken,
            transfers_in_amount: totals.transfers_in,
            transfers_out_amount: totals.transfers_out,
            repayments_amount: totals.repayments_made,
            created_at: account.created_at,
        }
    }
}

/// Summarizes one account. Deleted holders are summarized too.
pub fn summarize(snapshot: &LedgerSnapshot, account: &AccountHolder) -> LedgerResult<AccountSummary> {
    let totals = ledger_totals(snapshot)?;
    Ok(AccountSummary::new(
        account,
        totals.get(&account.id).copied().unwrap_or_default(),
    ))
}

/// Recomputes a balance from the entries alone.
///
/// Equals the stored balance whenever every mutation went through the engine.
pub fn derived_balance(snapshot: &LedgerSnapshot, account_id: AccountHolderId) -> LedgerResult<Money> {
    let t = ledger_totals(snapshot)?
        .get(&account_id)
        .copied()
        .unwrap_or_default();
    Ok(t.deposits + t.transfers_in + t.loans_taken + t.repayments_received
        - t.transfers_out
        - t.loans_given
        - t.repayments_made)
}

/// Account list filters. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Name contains.
    pub name: Option<String>,
    /// Account number contains.
    pub account_number: Option<String>,
    /// Page to return.
    pub page: PageRequest,
}

/// Non-deleted holders matching the filter, newest first, with summaries.
pub fn list_accounts(
    snapshot: &LedgerSnapshot,
    filter: &AccountFilter,
) -> LedgerResult<PageResponse<AccountSummary>> {
    let scope = ActiveScope::new(&snapshot.accounts);
    let totals = ledger_totals(snapshot)?;

    let mut accounts: Vec<&AccountHolder> = scope
        .accounts()
        .filter(|a| contains_ci(Some(&a.name), filter.name.as_deref()))
        .filter(|a| contains_ci(Some(&a.account_number), filter.account_number.as_deref()))
        .collect();
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let summaries = accounts
        .into_iter()
        .map(|a| AccountSummary::new(a, totals.get(&a.id).copied().unwrap_or_default()))
        .collect();
    Ok(filter.page.paginate(summaries))
}

/// Holder counts for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    /// Non-deleted holders with outstanding debt.
    pub count_account_holders_with_debts: u64,
    /// Non-deleted holders.
    pub count_all_account_holders: u64,
}

/// Counts non-deleted holders, and those still owing money.
pub fn account_stats(snapshot: &LedgerSnapshot) -> LedgerResult<AccountStats> {
    let scope = ActiveScope::new(&snapshot.accounts);
    let totals = ledger_totals(snapshot)?;

    let mut stats = AccountStats {
        count_account_holders_with_debts: 0,
        count_all_account_holders: 0,
    };
    for account in scope.accounts() {
        stats.count_all_account_holders += 1;
        let t = totals.get(&account.id).copied().unwrap_or_default();
        if (t.loans_taken - t.repaid_on_loans_taken).is_positive() {
            stats.count_account_holders_with_debts += 1;
        }
    }
    Ok(stats)
}

/// A loan that can still be repaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLoan {
    /// The loan.
    #[serde(flatten)]
    pub loan: Loan,
    /// Lender's name.
    pub lender_name: String,
    /// Borrower's name.
    pub borrower_name: String,
    /// Completed repayments so far.
    pub repaid_amount: Money,
    /// Debt left.
    pub remaining_debt: Money,
}

/// Pending or active loans with debt left, between non-deleted holders, newest first.
#[must_use]
pub fn open_loans(snapshot: &LedgerSnapshot) -> Vec<OpenLoan> {
    let scope = ActiveScope::new(&snapshot.accounts);
    let repaid = completed_repayments_by_loan(snapshot);

    let mut loans: Vec<OpenLoan> = snapshot
        .loans
        .iter()
        .filter(|loan| loan.status.is_open())
        .filter_map(|loan| {
            let lender = scope.name(loan.lender_id)?;
            let borrower = scope.name(loan.borrower_id)?;
            let repaid_amount = repaid.get(&loan.id).copied().unwrap_or_default();
            let remaining_debt = loan.amount - repaid_amount;
            remaining_debt.is_positive().then(|| OpenLoan {
                loan: loan.clone(),
                lender_name: lender.to_string(),
                borrower_name: borrower.to_string(),
                repaid_amount,
                remaining_debt,
            })
        })
        .collect();
    loans.sort_by(|a, b| b.loan.created_at.cmp(&a.loan.created_at));
    loans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Deposit, Repayment, Transfer};
    use chrono::Duration;
    use fundline_shared::types::{DepositId, LoanId, RepaymentId, TransferId};
    use rust_decimal_macros::dec;

    fn holder(name: &str, balance: Money, at: DateTime<Utc>) -> AccountHolder {
        AccountHolder {
            id: AccountHolderId::new(),
            name: name.to_string(),
            account_number: format!("ACC-{name}"),
            balance,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// Alice deposits 2000 and 50 (reversed), lends Bob 1000 at 10%, Bob repays 400,
    /// Bob sends Carol 100.
    fn sample() -> (LedgerSnapshot, [AccountHolder; 3]) {
        let t0 = Utc::now();
        let alice = holder("Alice", Money::new(dec!(1400)), t0);
        let bob = holder("Bob", Money::new(dec!(600)), t0 + Duration::seconds(1));
        let carol = holder("Carol", Money::new(dec!(100)), t0 + Duration::seconds(2));
        let loan = Loan {
            id: LoanId::new(),
            lender_id: alice.id,
            borrower_id: bob.id,
            amount: Money::new(dec!(1100)),
            interest_rate: dec!(10),
            due_date: t0,
            status: LoanStatus::Pending,
            created_at: t0 + Duration::seconds(5),
        };
        let snapshot = LedgerSnapshot {
            accounts: vec![alice.clone(), bob.clone(), carol.clone()],
            deposits: vec![
                Deposit {
                    id: DepositId::new(),
                    user_id: alice.id,
                    amount: Money::new(dec!(2000)),
                    status: EntryStatus::Completed,
                    created_at: t0 + Duration::seconds(3),
                },
                Deposit {
                    id: DepositId::new(),
                    user_id: alice.id,
                    amount: Money::new(dec!(50)),
                    status: EntryStatus::Reversed,
                    created_at: t0 + Duration::seconds(4),
                },
            ],
            transfers: vec![Transfer {
                id: TransferId::new(),
                sender_id: bob.id,
                receiver_id: carol.id,
                amount: Money::new(dec!(100)),
                status: EntryStatus::Completed,
                related_transaction_id: None,
                created_at: t0 + Duration::seconds(7),
            }],
            repayments: vec![Repayment {
                id: RepaymentId::new(),
                loan_id: loan.id,
                payer_id: bob.id,
                amount: Money::new(dec!(400)),
                status: EntryStatus::Completed,
                created_at: t0 + Duration::seconds(6),
            }],
            loans: vec![loan],
        };
        (snapshot, [alice, bob, carol])
    }

    #[test]
    fn test_summary_totals() {
        let (snapshot, [alice, bob, carol]) = sample();

        let a = summarize(&snapshot, &alice).unwrap();
        assert_eq!(a.deposits_amount, Money::new(dec!(2000)));
        assert_eq!(a.total_loan_taken, Money::ZERO);
        assert_eq!(a.outstanding_debt, Money::ZERO);

        let b = summarize(&snapshot, &bob).unwrap();
        assert_eq!(b.total_loan_taken, Money::new(dec!(1100)));
        assert_eq!(b.total_repaid_on_loans, Money::new(dec!(400)));
        assert_eq!(b.outstanding_debt, Money::new(dec!(700)));
        assert_eq!(b.repayments_amount, Money::new(dec!(400)));
        assert_eq!(b.transfers_out_amount, Money::new(dec!(100)));

        let c = summarize(&snapshot, &carol).unwrap();
        assert_eq!(c.transfers_in_amount, Money::new(dec!(100)));
    }

    #[test]
    fn test_derived_balance_matches_stored() {
        let (snapshot, holders) = sample();
        for holder in &holders {
            assert_eq!(
                derived_balance(&snapshot, holder.id).unwrap(),
                holder.balance,
                "{}",
                holder.name
            );
        }
    }

    #[test]
    fn test_list_accounts_filters_and_orders() {
        let (snapshot, [alice, _, carol]) = sample();

        let all = list_accounts(&snapshot, &AccountFilter::default()).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.data[0].id, carol.id);

        let filtered = list_accounts(
            &snapshot,
            &AccountFilter {
                name: Some("LIC".to_string()),
                ..AccountFilter::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.data[0].id, alice.id);

        let by_number = list_accounts(
            &snapshot,
            &AccountFilter {
                account_number: Some("acc-".to_string()),
                page: PageRequest { page: 2, limit: 2 },
                ..AccountFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_number.total, 3);
        assert_eq!(by_number.data.len(), 1);
        assert_eq!(by_number.data[0].id, alice.id);
    }

    #[test]
    fn test_stats_and_deleted_holders() {
        let (mut snapshot, _) = sample();
        let stats = account_stats(&snapshot).unwrap();
        assert_eq!(stats.count_all_account_holders, 3);
        assert_eq!(stats.count_account_holders_with_debts, 1);

        snapshot.accounts[2].deleted_at = Some(Utc::now());
        let stats = account_stats(&snapshot).unwrap();
        assert_eq!(stats.count_all_account_holders, 2);
        assert_eq!(
            list_accounts(&snapshot, &AccountFilter::default())
                .unwrap()
                .total,
            2
        );
    }

    #[test]
    fn test_open_loans() {
        let (mut snapshot, _) = sample();
        let open = open_loans(&snapshot);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].remaining_debt, Money::new(dec!(700)));
        assert_eq!(open[0].lender_name, "Alice");

        snapshot.loans[0].status = LoanStatus::Repaid;
        assert!(open_loans(&snapshot).is_empty());
    }
}
