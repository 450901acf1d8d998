//! Websocket stream of ledger change events at `/events`.
//!
//! Each event is sent as a text frame holding the event name. Clients that fall behind
//! the channel capacity skip the missed events and keep receiving.

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use fundline_core::notify::LedgerEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::AppState;

/// Creates the event stream route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(events_handler))
}

async fn events_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let events = state.events.subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, events))
}

async fn stream_events(socket: WebSocket, mut events: broadcast::Receiver<LedgerEvent>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!("event subscriber connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if sender.send(Message::Text(event.name().into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!("event subscriber disconnected");
}
