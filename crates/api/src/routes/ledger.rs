//! Ledger entry routes under `/account-managment`.
//!
//! Creates and reversals return 201 with the committed record. Reads return 200.

use std::borrow::Cow;
use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use fundline_core::ledger::{
    CreateDepositInput, CreateLoanInput, CreateRepaymentInput, CreateTransferInput,
};
use fundline_core::query::{TransactionFilter, TransactionKind};
use fundline_shared::types::{
    AccountHolderId, DepositId, LoanId, Money, PageRequest, RepaymentId, TransferId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::AppState;
use crate::extractors::{IdPath, ValidatedJson, ValidatedQuery};
use crate::response::{ApiError, ApiResult, ApiSuccess};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account-managment", get(list_transactions))
        .route("/account-managment/", get(list_transactions))
        .route("/account-managment/deposit", post(create_deposit))
        .route("/account-managment/loan", post(create_loan))
        .route("/account-managment/transfer", post(create_transfer))
        .route("/account-managment/repayment", post(create_repayment))
        .route("/account-managment/loans/active", get(open_loans))
        .route("/account-managment/{id}", get(transactions_for_account))
        .route("/account-managment/deposit/{id}/reverse", post(reverse_deposit))
        .route("/account-managment/transfer/{id}/reverse", post(reverse_transfer))
        .route("/account-managment/loan/{id}/reverse", post(reverse_loan))
        .route("/account-managment/repayment/{id}/reverse", post(reverse_repayment))
}

// ============================================================================
// Request Types
// ============================================================================

/// Largest amount a single request may move.
pub const MAX_REQUEST_AMOUNT: Decimal = dec!(1000000000000000);

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > MAX_REQUEST_AMOUNT {
        return Err(ValidationError::new("amount_range").with_message(Cow::Owned(format!(
            "Amount must not exceed {MAX_REQUEST_AMOUNT}"
        ))));
    }
    Ok(())
}

/// Body for POST `/deposit`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DepositRequest {
    /// Account credited.
    #[validate(required(message = "userId is required"))]
    pub user_id: Option<AccountHolderId>,
    /// Amount, must be positive.
    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_amount")
    )]
    pub amount: Option<Decimal>,
}

/// Body for POST `/transfer`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferRequest {
    /// Paying account.
    #[validate(required(message = "senderId is required"))]
    pub sender_id: Option<AccountHolderId>,
    /// Receiving account.
    #[validate(required(message = "receiverId is required"))]
    pub receiver_id: Option<AccountHolderId>,
    /// Amount, must be positive.
    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_amount")
    )]
    pub amount: Option<Decimal>,
}

/// Body for POST `/loan`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoanRequest {
    /// Lending account.
    #[validate(required(message = "lenderId is required"))]
    pub lender_id: Option<AccountHolderId>,
    /// Borrowing account.
    #[validate(required(message = "borrowerId is required"))]
    pub borrower_id: Option<AccountHolderId>,
    /// Principal.
    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_amount")
    )]
    pub amount: Option<Decimal>,
    /// Interest percentage.
    #[validate(required(message = "interestRate is required"))]
    pub interest_rate: Option<Decimal>,
    /// Defaults to now.
    pub due_date: Option<DateTime<Utc>>,
}

/// Body for POST `/repayment`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepaymentRequest {
    /// Loan being repaid.
    #[validate(required(message = "loanId is required"))]
    pub loan_id: Option<LoanId>,
    /// Paying account.
    #[validate(required(message = "payerId is required"))]
    pub payer_id: Option<AccountHolderId>,
    /// Amount, must not exceed the remaining debt.
    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_amount")
    )]
    pub amount: Option<Decimal>,
}

/// Feed filters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionQuery {
    /// Sender name contains.
    pub sender: Option<String>,
    /// Receiver name contains.
    pub receiver: Option<String>,
    /// Exact amount.
    pub amount: Option<Decimal>,
    /// `deposit`, `transfer`, `loan` or `repayment`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Entry status.
    pub status: Option<String>,
    /// Page number (1-indexed).
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    /// Page size.
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u32>,
}

impl TryFrom<TransactionQuery> for TransactionFilter {
    type Error = ApiError;

    fn try_from(query: TransactionQuery) -> Result<Self, Self::Error> {
        let kind = query
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(TransactionKind::from_str)
            .transpose()
            .map_err(|_| {
                ApiError::bad_request("type must be one of deposit, transfer, loan, repayment")
            })?;
        Ok(Self {
            sender: query.sender,
            receiver: query.receiver,
            amount: query.amount.map(Money::new),
            kind,
            status: query.status,
            page: PageRequest::new(query.page, query.limit),
        })
    }
}

/// Validation guarantees presence; this only satisfies the type system.
fn present<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(message))
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn create_deposit(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DepositRequest>,
) -> ApiResult {
    let input = CreateDepositInput {
        user_id: present(payload.user_id, "userId is required")?,
        amount: Money::new(present(payload.amount, "Amount is required")?),
    };
    let deposit = state.engine.create_deposit(input).await?;
    info!(deposit_id = %deposit.id, amount = %deposit.amount, "deposit created");
    Ok(ApiSuccess::with_message(deposit, "Deposit successfull").created())
}

async fn create_transfer(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TransferRequest>,
) -> ApiResult {
    let input = CreateTransferInput {
        sender_id: present(payload.sender_id, "senderId is required")?,
        receiver_id: present(payload.receiver_id, "receiverId is required")?,
        amount: Money::new(present(payload.amount, "Amount is required")?),
    };
    let transfer = state.engine.create_transfer(input).await?;
    info!(transfer_id = %transfer.id, amount = %transfer.amount, "transfer created");
    Ok(ApiSuccess::with_message(transfer, "Transfer successfull").created())
}

async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoanRequest>,
) -> ApiResult {
    let input = CreateLoanInput {
        lender_id: present(payload.lender_id, "lenderId is required")?,
        borrower_id: present(payload.borrower_id, "borrowerId is required")?,
        amount: Money::new(present(payload.amount, "Amount is required")?),
        interest_rate: present(payload.interest_rate, "interestRate is required")?,
        due_date: payload.due_date,
    };
    let loan = state.engine.create_loan(input).await?;
    info!(loan_id = %loan.id, total = %loan.amount, "loan created");
    Ok(ApiSuccess::with_message(loan, "Loan successfull").created())
}

async fn create_repayment(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RepaymentRequest>,
) -> ApiResult {
    let input = CreateRepaymentInput {
        loan_id: present(payload.loan_id, "loanId is required")?,
        payer_id: present(payload.payer_id, "payerId is required")?,
        amount: Money::new(present(payload.amount, "Amount is required")?),
    };
    let outcome = state.engine.create_repayment(input).await?;
    info!(
        repayment_id = %outcome.repayment.id,
        remaining = %outcome.remaining_debt,
        "repayment created"
    );
    Ok(ApiSuccess::with_message(outcome, "Repayment successfull").created())
}

/// GET `/account-managment/` - Paginated feed of all entries.
async fn list_transactions(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TransactionQuery>,
) -> ApiResult {
    let filter = TransactionFilter::try_from(query)?;
    let page = state.queries.list_transactions(&filter).await?;
    Ok(ApiSuccess::with_message(page, "All transactions").ok())
}

/// GET `/account-managment/{id}` - Every entry one holder takes part in.
async fn transactions_for_account(
    State(state): State<AppState>,
    IdPath(id): IdPath<AccountHolderId>,
) -> ApiResult {
    let rows = state.queries.transactions_for_account(id).await?;
    Ok(ApiSuccess::with_message(rows, "All transactions").ok())
}

async fn open_loans(State(state): State<AppState>) -> ApiResult {
    let loans = state.queries.open_loans().await?;
    Ok(ApiSuccess::new(loans).ok())
}

async fn reverse_deposit(
    State(state): State<AppState>,
    IdPath(id): IdPath<DepositId>,
) -> ApiResult {
    let deposit = state.engine.reverse_deposit(id).await?;
    info!(deposit_id = %id, "deposit reversed");
    Ok(ApiSuccess::with_message(deposit, "Deposit reversed").created())
}

async fn reverse_transfer(
    State(state): State<AppState>,
    IdPath(id): IdPath<TransferId>,
) -> ApiResult {
    let reversal = state.engine.reverse_transfer(id).await?;
    info!(transfer_id = %id, reversal_id = %reversal.reversal.id, "transfer reversed");
    Ok(ApiSuccess::with_message(reversal, "Transfer reversed").created())
}

async fn reverse_loan(State(state): State<AppState>, IdPath(id): IdPath<LoanId>) -> ApiResult {
    let reversal = state.engine.reverse_loan(id).await?;
    info!(loan_id = %id, principal = %reversal.principal_returned, "loan reversed");
    Ok(ApiSuccess::with_message(reversal, "Loan reversed").created())
}

async fn reverse_repayment(
    State(state): State<AppState>,
    IdPath(id): IdPath<RepaymentId>,
) -> ApiResult {
    let repayment = state.engine.reverse_repayment(id).await?;
    info!(repayment_id = %id, "repayment reversed");
    Ok(ApiSuccess::with_message(repayment, "Repayment reversed").created())
}
