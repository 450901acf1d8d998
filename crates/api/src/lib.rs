//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST API routes for account holders and ledger entries
//! - A websocket stream of ledger change events
//! - Validating request extractors
//! - Response envelope and error mapping

pub mod extractors;
pub mod notify;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use fundline_core::accounts::AccountHolderService;
use fundline_core::ledger::{LedgerPolicy, LedgerStore, TransactionEngine};
use fundline_core::notify::LedgerEvent;
use fundline_core::query::LedgerQueryService;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::notify::BroadcastNotifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Balance-mutating operations.
    pub engine: TransactionEngine,
    /// Account holder management.
    pub accounts: AccountHolderService,
    /// Read-side queries.
    pub queries: LedgerQueryService,
    /// Change events fanned out to websocket clients.
    pub events: broadcast::Sender<LedgerEvent>,
}

impl AppState {
    /// Wires the services over one store, announcing through a broadcast channel.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, policy: LedgerPolicy, channel_capacity: usize) -> Self {
        let notifier = Arc::new(BroadcastNotifier::new(channel_capacity));
        let events = notifier.sender();
        Self {
            engine: TransactionEngine::new(store.clone(), notifier.clone()).with_policy(policy),
            accounts: AccountHolderService::new(store.clone(), notifier),
            queries: LedgerQueryService::new(store),
            events,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
