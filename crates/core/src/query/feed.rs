//! Unified, filterable transaction feed over the four entry kinds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fundline_shared::types::{AccountHolderId, LoanId, Money, PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ActiveScope;
use crate::ledger::{EntryStatus, LedgerSnapshot};

/// Entry kind of a feed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// A deposit.
    #[serde(alias = "DEPOSIT", alias = "Deposit")]
    Deposit,
    /// A transfer.
    #[serde(alias = "TRANSFER", alias = "Transfer")]
    Transfer,
    /// A loan.
    #[serde(alias = "LOAN", alias = "Loan")]
    Loan,
    /// A repayment.
    #[serde(alias = "REPAYMENT", alias = "Repayment")]
    Repayment,
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "transfer" => Ok(Self::Transfer),
            "loan" => Ok(Self::Loan),
            "repayment" => Ok(Self::Repayment),
            _ => Err(format!("Unknown transaction type: {s}")),
        }
    }
}

/// One entry of any kind in the normalized feed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Entry id.
    pub id: Uuid,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Entry amount; the stored total for loans.
    pub amount: Money,
    /// Name of the paying side. `None` for deposits.
    pub sender: Option<String>,
    /// Name of the receiving side.
    pub receiver: Option<String>,
    /// Interest rate of the loan, for loans and repayments.
    pub interest_rate: Option<Decimal>,
    /// Lowercase status name.
    pub status: &'static str,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
    /// Loan amount minus completed repayments, for repayments only.
    pub remaining_debt: Option<Money>,
    /// Accounts taking part in the entry, in any role.
    #[serde(skip)]
    pub participants: Vec<AccountHolderId>,
}

impl TransactionView {
    /// Returns true if `account_id` takes part in this entry.
    #[must_use]
    pub fn involves(&self, account_id: AccountHolderId) -> bool {
        self.participants.contains(&account_id)
    }
}

/// Feed filters. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Sender name contains.
    pub sender: Option<String>,
    /// Receiver name contains.
    pub receiver: Option<String>,
    /// Exact amount.
    pub amount: Option<Money>,
    /// Entry kind.
    pub kind: Option<TransactionKind>,
    /// Status name, compared case-insensitively.
    pub status: Option<String>,
    /// Page to return.
    pub page: PageRequest,
}

impl TransactionFilter {
    /// Returns true if `view` passes every set filter.
    #[must_use]
    pub fn matches(&self, view: &TransactionView) -> bool {
        contains_ci(view.sender.as_deref(), self.sender.as_deref())
            && contains_ci(view.receiver.as_deref(), self.receiver.as_deref())
            && self.amount.is_none_or(|amount| view.amount == amount)
            && self.kind.is_none_or(|kind| view.kind == kind)
            && self
                .status
                .as_deref()
                .map(str::trim)
                .filter(|status| !status.is_empty())
                .is_none_or(|status| view.status.eq_ignore_ascii_case(status))
    }
}

/// Substring match ignoring case. A blank needle matches everything; a missing
/// haystack only matches a blank needle.
pub(crate) fn contains_ci(haystack: Option<&str>, needle: Option<&str>) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
        return true;
    };
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Maps every entry whose participants are all non-deleted into the feed shape.
///
/// Rows come out grouped by kind, each group in creation order.
#[must_use]
pub fn normalize(snapshot: &LedgerSnapshot) -> Vec<TransactionView> {
    let scope = ActiveScope::new(&snapshot.accounts);
    let repaid = completed_repayments_by_loan(snapshot);
    let mut views = Vec::with_capacity(
        snapshot.deposits.len()
            + snapshot.transfers.len()
            + snapshot.loans.len()
            + snapshot.repayments.len(),
    );

    for deposit in &snapshot.deposits {
        let Some(owner) = scope.name(deposit.user_id) else {
            continue;
        };
        views.push(TransactionView {
            id: deposit.id.into_inner(),
            kind: TransactionKind::Deposit,
            amount: deposit.amount,
            sender: None,
            receiver: Some(owner.to_string()),
            interest_rate: None,
            status: deposit.status.as_str(),
            created_at: deposit.created_at,
            remaining_debt: None,
            participants: vec![deposit.user_id],
        });
    }

    for transfer in &snapshot.transfers {
        let (Some(sender), Some(receiver)) =
            (scope.name(transfer.sender_id), scope.name(transfer.receiver_id))
        else {
            continue;
        };
        views.push(TransactionView {
            id: transfer.id.into_inner(),
            kind: TransactionKind::Transfer,
            amount: transfer.amount,
            sender: Some(sender.to_string()),
            receiver: Some(receiver.to_string()),
            interest_rate: None,
            status: transfer.status.as_str(),
            created_at: transfer.created_at,
            remaining_debt: None,
            participants: vec![transfer.sender_id, transfer.receiver_id],
        });
    }

    let loans: HashMap<LoanId, _> = snapshot.loans.iter().map(|l| (l.id, l)).collect();

    for loan in &snapshot.loans {
        let (Some(lender), Some(borrower)) =
            (scope.name(loan.lender_id), scope.name(loan.borrower_id))
        else {
            continue;
        };
        views.push(TransactionView {
            id: loan.id.into_inner(),
            kind: TransactionKind::Loan,
            amount: loan.amount,
            sender: Some(lender.to_string()),
            receiver: Some(borrower.to_string()),
            interest_rate: Some(loan.interest_rate),
            status: loan.status.as_str(),
            created_at: loan.created_at,
            remaining_debt: None,
            participants: vec![loan.lender_id, loan.borrower_id],
        });
    }

    for repayment in &snapshot.repayments {
        let Some(loan) = loans.get(&repayment.loan_id) else {
            continue;
        };
        let (Some(payer), Some(lender)) =
            (scope.name(repayment.payer_id), scope.name(loan.lender_id))
        else {
            continue;
        };
        let repaid_on_loan = repaid.get(&loan.id).copied().unwrap_or_default();
        views.push(TransactionView {
            id: repayment.id.into_inner(),
            kind: TransactionKind::Repayment,
            amount: repayment.amount,
            sender: Some(payer.to_string()),
            receiver: Some(lender.to_string()),
            interest_rate: Some(loan.interest_rate),
            status: repayment.status.as_str(),
            created_at: repayment.created_at,
            remaining_debt: Some(loan.amount - repaid_on_loan),
            participants: vec![repayment.payer_id, loan.lender_id],
        });
    }

    views
}

/// Sum of completed repayments per loan.
pub(crate) fn completed_repayments_by_loan(snapshot: &LedgerSnapshot) -> HashMap<LoanId, Money> {
    let mut repaid: HashMap<LoanId, Money> = HashMap::new();
    for repayment in snapshot
        .repayments
        .iter()
        .filter(|r| r.status == EntryStatus::Completed)
    {
        *repaid.entry(repayment.loan_id).or_default() += repayment.amount;
    }
    repaid
}

/// Newest first. The sort is stable, so equal timestamps keep their input order.
fn sort_newest_first(views: &mut [TransactionView]) {
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Filters, orders newest first and paginates the whole feed.
#[must_use]
pub fn list_transactions(
    snapshot: &LedgerSnapshot,
    filter: &TransactionFilter,
) -> PageResponse<TransactionView> {
    let mut views: Vec<_> = normalize(snapshot)
        .into_iter()
        .filter(|view| filter.matches(view))
        .collect();
    sort_newest_first(&mut views);
    filter.page.paginate(views)
}

/// Every feed row the account takes part in, newest first, unpaginated.
#[must_use]
pub fn transactions_for_account(
    snapshot: &LedgerSnapshot,
    account_id: AccountHolderId,
) -> Vec<TransactionView> {
    let mut views: Vec<_> = normalize(snapshot)
        .into_iter()
        .filter(|view| view.involves(account_id))
        .collect();
    sort_newest_first(&mut views);
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountHolder, Deposit, Loan, LoanStatus, Repayment, Transfer};
    use chrono::Duration;
    use fundline_shared::types::{DepositId, RepaymentId, TransferId};
    use rust_decimal_macros::dec;

    fn holder(name: &str, at: DateTime<Utc>) -> AccountHolder {
        AccountHolder {
            id: AccountHolderId::new(),
            name: name.to_string(),
            account_number: format!("ACC-{name}"),
            balance: Money::ZERO,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    /// Alice deposits 500, sends Bob 100, lends Bob 1000 at 10%, Bob repays 400.
    fn sample() -> (LedgerSnapshot, AccountHolder, AccountHolder) {
        let t0 = Utc::now();
        let alice = holder("Alice", t0);
        let bob = holder("Bob", t0);
        let loan = Loan {
            id: LoanId::new(),
            lender_id: alice.id,
            borrower_id: bob.id,
            amount: Money::new(dec!(1100)),
            interest_rate: dec!(10),
            due_date: t0,
            status: LoanStatus::Pending,
            created_at: t0 + Duration::seconds(3),
        };
        let snapshot = LedgerSnapshot {
            accounts: vec![alice.clone(), bob.clone()],
            deposits: vec![Deposit {
                id: DepositId::new(),
                user_id: alice.id,
                amount: Money::new(dec!(500)),
                status: EntryStatus::Completed,
                created_at: t0 + Duration::seconds(1),
            }],
            transfers: vec![Transfer {
                id: TransferId::new(),
                sender_id: alice.id,
                receiver_id: bob.id,
                amount: Money::new(dec!(100)),
                status: EntryStatus::Completed,
                related_transaction_id: None,
                created_at: t0 + Duration::seconds(2),
            }],
            repayments: vec![Repayment {
                id: RepaymentId::new(),
                loan_id: loan.id,
                payer_id: bob.id,
                amount: Money::new(dec!(400)),
                status: EntryStatus::Completed,
                created_at: t0 + Duration::seconds(4),
            }],
            loans: vec![loan],
        };
        (snapshot, alice, bob)
    }

    #[test]
    fn test_normalize_maps_each_kind() {
        let (snapshot, _, _) = sample();
        let views = normalize(&snapshot);
        assert_eq!(views.len(), 4);

        let deposit = &views[0];
        assert_eq!(deposit.kind, TransactionKind::Deposit);
        assert_eq!(deposit.sender, None);
        assert_eq!(deposit.receiver.as_deref(), Some("Alice"));

        let repayment = views
            .iter()
            .find(|v| v.kind == TransactionKind::Repayment)
            .unwrap();
        assert_eq!(repayment.sender.as_deref(), Some("Bob"));
        assert_eq!(repayment.receiver.as_deref(), Some("Alice"));
        assert_eq!(repayment.remaining_debt, Some(Money::new(dec!(700))));
        assert_eq!(repayment.interest_rate, Some(dec!(10)));
    }

    #[test]
    fn test_list_orders_newest_first() {
        let (snapshot, _, _) = sample();
        let page = list_transactions(&snapshot, &TransactionFilter::default());
        let kinds: Vec<_> = page.data.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Repayment,
                TransactionKind::Loan,
                TransactionKind::Transfer,
                TransactionKind::Deposit,
            ]
        );
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_filters() {
        let (snapshot, _, _) = sample();

        let by_sender = TransactionFilter {
            sender: Some("ali".to_string()),
            ..TransactionFilter::default()
        };
        // Deposits have no sender, so only the transfer and the loan match.
        assert_eq!(list_transactions(&snapshot, &by_sender).total, 2);

        let by_receiver = TransactionFilter {
            receiver: Some("BOB".to_string()),
            ..TransactionFilter::default()
        };
        assert_eq!(list_transactions(&snapshot, &by_receiver).total, 2);

        let by_amount = TransactionFilter {
            amount: Some(Money::new(dec!(100.00))),
            ..TransactionFilter::default()
        };
        let page = list_transactions(&snapshot, &by_amount);
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].kind, TransactionKind::Transfer);

        let by_kind_and_status = TransactionFilter {
            kind: Some(TransactionKind::Loan),
            status: Some("PENDING".to_string()),
            ..TransactionFilter::default()
        };
        assert_eq!(list_transactions(&snapshot, &by_kind_and_status).total, 1);

        let blank = TransactionFilter {
            sender: Some("  ".to_string()),
            status: Some(String::new()),
            ..TransactionFilter::default()
        };
        assert_eq!(list_transactions(&snapshot, &blank).total, 4);
    }

    #[test]
    fn test_pagination_reports_pre_slice_total() {
        let (snapshot, _, _) = sample();
        let filter = TransactionFilter {
            page: PageRequest { page: 2, limit: 3 },
            ..TransactionFilter::default()
        };
        let page = list_transactions(&snapshot, &filter);
        assert_eq!(page.total, 4);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_soft_deleted_participant_hides_entries() {
        let (mut snapshot, _, bob) = sample();
        snapshot
            .accounts
            .iter_mut()
            .find(|a| a.id == bob.id)
            .unwrap()
            .deleted_at = Some(Utc::now());

        let views = normalize(&snapshot);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].kind, TransactionKind::Deposit);
    }

    #[test]
    fn test_transactions_for_account() {
        let (snapshot, alice, bob) = sample();
        assert_eq!(transactions_for_account(&snapshot, alice.id).len(), 4);
        let bobs = transactions_for_account(&snapshot, bob.id);
        assert_eq!(bobs.len(), 3);
        assert!(bobs.iter().all(|v| v.kind != TransactionKind::Deposit));
        assert!(transactions_for_account(&snapshot, AccountHolderId::new()).is_empty());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("DEPOSIT".parse::<TransactionKind>().unwrap(), TransactionKind::Deposit);
        assert_eq!("Loan".parse::<TransactionKind>().unwrap(), TransactionKind::Loan);
        assert!("refund".parse::<TransactionKind>().is_err());
        let kind: TransactionKind = serde_json::from_str("\"REPAYMENT\"").unwrap();
        assert_eq!(kind, TransactionKind::Repayment);
    }

    #[test]
    fn test_view_serializes_feed_shape() {
        let (snapshot, _, _) = sample();
        let views = normalize(&snapshot);
        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["amount"], "500");
        assert_eq!(json["status"], "completed");
        assert!(json["sender"].is_null());
        assert!(json.get("participants").is_none());
        assert!(json.get("remainingDebt").is_some());
    }
}
