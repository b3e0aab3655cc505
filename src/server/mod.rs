//! Web server module for the sync host.
//!
//! This module contains the Axum web server that hosts one document and
//! relays updates between connected editors.

pub mod routes;
pub mod websocket;

// Re-export main server functionality
pub use routes::{AppState, Relayed, create_router};
pub use websocket::handle_websocket_connection;
