//! Account holder routes under `/account`.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use fundline_core::ledger::{AccountHolderInput, Deletion};
use fundline_core::query::AccountFilter;
use fundline_shared::types::{AccountHolderId, PageRequest};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::AppState;
use crate::extractors::{IdPath, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResult, ApiSuccess};

/// Creates the account holder routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(list_accounts))
        .route("/account/", get(list_accounts))
        .route("/account/create", post(create_account))
        .route("/account/update/{id}", put(update_account))
        .route("/account/stats", get(account_stats))
        .route("/account/{id}", get(get_account).delete(delete_account))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for creating or updating an account holder.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountHolderRequest {
    /// Display name, unique among live holders.
    #[validate(
        required(message = "Name is required"),
        length(min = 1, message = "Name is required")
    )]
    pub name: Option<String>,
    /// External account number.
    #[validate(
        required(message = "Account Number is required"),
        length(min = 1, message = "Account Number is required")
    )]
    pub account_number: Option<String>,
}

impl AccountHolderRequest {
    fn into_input(self) -> AccountHolderInput {
        AccountHolderInput {
            name: self.name.unwrap_or_default(),
            account_number: self.account_number.unwrap_or_default(),
        }
    }
}

/// Query parameters for listing account holders.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountListQuery {
    /// Name contains (case-insensitive).
    pub name: Option<String>,
    /// Account number contains (case-insensitive).
    pub account_number: Option<String>,
    /// Page number (1-indexed).
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u32>,
    /// Page size.
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u32>,
}

/// Result of a delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// Deleted holder.
    pub id: AccountHolderId,
    /// Whether the row was kept with `deletedAt` set.
    pub soft_deleted: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/account/create`
async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AccountHolderRequest>,
) -> ApiResult {
    let account = state.accounts.create(payload.into_input()).await?;
    info!(account_id = %account.id, "account holder created");
    Ok(ApiSuccess::with_message(account, "Account holder created successfully").created())
}

/// PUT `/account/update/{id}`
async fn update_account(
    State(state): State<AppState>,
    IdPath(id): IdPath<AccountHolderId>,
    ValidatedJson(payload): ValidatedJson<AccountHolderRequest>,
) -> ApiResult {
    let account = state.accounts.update(id, payload.into_input()).await?;
    info!(account_id = %id, "account holder updated");
    Ok(ApiSuccess::with_message(account, "Account holder updated successfully").created())
}

/// GET `/account/`
async fn list_accounts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AccountListQuery>,
) -> ApiResult {
    let filter = AccountFilter {
        name: query.name,
        account_number: query.account_number,
        page: PageRequest::new(query.page, query.limit),
    };
    let page = state.queries.list_accounts(&filter).await?;
    Ok(ApiSuccess::new(page).ok())
}

/// GET `/account/stats`
async fn account_stats(State(state): State<AppState>) -> ApiResult {
    let stats = state.queries.account_stats().await?;
    Ok(ApiSuccess::new(stats).ok())
}

/// GET `/account/{id}` - Holder with derived totals.
async fn get_account(
    State(state): State<AppState>,
    IdPath(id): IdPath<AccountHolderId>,
) -> ApiResult {
    let summary = state.queries.account_summary(id).await?;
    Ok(ApiSuccess::new(summary).ok())
}

/// DELETE `/account/{id}`
async fn delete_account(
    State(state): State<AppState>,
    IdPath(id): IdPath<AccountHolderId>,
) -> ApiResult {
    let deletion = state.accounts.delete(id).await?;
    info!(account_id = %id, ?deletion, "account holder deleted");
    let body = DeleteResponse {
        id,
        soft_deleted: deletion == Deletion::SoftDeleted,
    };
    Ok(ApiSuccess::with_message(body, "Account holder deleted successfully").ok())
}
