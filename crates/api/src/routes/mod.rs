//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod events;
pub mod health;
pub mod ledger;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(ledger::routes())
        .merge(events::routes())
}
