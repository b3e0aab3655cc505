//! Route handlers for the sync host.
//!
//! This module contains all the HTTP route handlers and the shared state for
//! the Axum server.

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::document::Document;
use crate::server::websocket::handle_websocket_connection;
use crate::sync::Update;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct TextResponse {
    pub text: String,
}

/// An update applied by one session, fanned out to the others.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub from: u64,
    pub update: Update,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    document: Arc<Document>,
    relay: broadcast::Sender<Relayed>,
    next_session: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(document: Arc<Document>, channel_capacity: usize) -> Self {
        let (relay, _) = broadcast::channel(channel_capacity.max(1));
        AppState {
            document,
            relay,
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn relay(&self) -> &broadcast::Sender<Relayed> {
        &self.relay
    }

    /// Allocates an id for a new websocket session
    pub fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::SeqCst)
    }
}

/// Basic health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
    })
}

/// Current text of the hosted document
pub async fn text(State(state): State<AppState>) -> Json<TextResponse> {
    Json(TextResponse {
        text: state.document().get_text(),
    })
}

/// WebSocket connection handler for collaborative editing
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state))
}

/// Creates and configures the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/text", get(text))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let state = AppState::new(Arc::new(Document::with_replica(1)), 0);
        let a = state.next_session_id();
        let b = state.clone().next_session_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_text_handler() {
        let document = Arc::new(Document::with_replica(1));
        document.insert_text(0, "verse").unwrap();
        let Json(body) = text(State(AppState::new(document, 8))).await;
        assert_eq!(body.text, "verse");
    }
}
