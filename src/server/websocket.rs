//! WebSocket session management for collaborative editing.
//!
//! This module handles WebSocket connections, sync message parsing, and
//! relaying updates between the editors connected to one document.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::crdt::StateVector;
use crate::error::SyncError;
use crate::server::routes::{AppState, Relayed};
use crate::sync::SyncMessage;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// WebSocket session manager
pub struct WebSocketSession {
    sender: SplitSink<WebSocket, Message>,
    receiver: SplitStream<WebSocket>,
    state: AppState,
    session_id: u64,
}

impl WebSocketSession {
    /// Create a new WebSocket session
    pub fn new(socket: WebSocket, state: AppState, session_id: u64) -> Self {
        let (sender, receiver) = socket.split();
        Self {
            sender,
            receiver,
            state,
            session_id,
        }
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(mut self) {
        info!("WebSocket session {} established", self.session_id);

        // Subscribe before announcing ourselves so no relayed update is missed
        let mut relay = self.state.relay().subscribe();

        let hello = SyncMessage::SyncStep1 {
            state_vector: self.state.document().state_vector(),
        };
        if let Err(e) = self.send_message(&hello).await {
            error!("Failed to send state vector to {}: {}", self.session_id, e);
            return;
        }

        loop {
            tokio::select! {
                incoming = self.receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.handle_frame(&text).await {
                            error!("Error replying to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let Ok(text) = String::from_utf8(bytes) else {
                            warn!("Session {} sent a non UTF-8 frame", self.session_id);
                            continue;
                        };
                        if let Err(e) = self.handle_frame(&text).await {
                            error!("Error replying to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = self.sender.send(Message::Pong(data)).await {
                            error!("Failed to send pong to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket session {} closed by client", self.session_id);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore pongs
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", self.session_id, e);
                        break;
                    }
                },
                relayed = relay.recv() => match relayed {
                    Ok(Relayed { from, .. }) if from == self.session_id => {}
                    Ok(Relayed { update, .. }) => {
                        if let Err(e) = self.send_message(&SyncMessage::Update { update }).await {
                            error!("Failed to relay update to {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed updates are covered by resending the whole document
                        warn!("Session {} lagged behind by {} updates", self.session_id, skipped);
                        let update = self.state.document().update_since(&StateVector::new());
                        if let Err(e) = self.send_message(&SyncMessage::SyncStep2 { update }).await {
                            error!("Failed to resync {}: {}", self.session_id, e);
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("WebSocket session {} ended", self.session_id);
    }

    /// Handle one incoming sync frame
    async fn handle_frame(&mut self, text: &str) -> Result<(), SendError> {
        let message = match SyncMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to parse frame from {}: {}", self.session_id, e);
                return Ok(()); // Don't break connection for parse errors
            }
        };

        match message {
            SyncMessage::SyncStep1 { state_vector } => {
                let update = self.state.document().update_since(&state_vector);
                debug!(
                    "Session {} is missing {} records",
                    self.session_id,
                    update.len()
                );
                self.send_message(&SyncMessage::SyncStep2 { update }).await
            }
            SyncMessage::SyncStep2 { update } | SyncMessage::Update { update } => {
                if update.is_empty() {
                    return Ok(());
                }
                match self.state.document().apply(update.clone()) {
                    Ok(()) | Err(SyncError::MissingDependency { .. }) => {
                        // No receivers simply means nobody else is connected
                        let _ = self.state.relay().send(Relayed {
                            from: self.session_id,
                            update,
                        });
                    }
                    Err(e) => warn!("Rejected update from {}: {}", self.session_id, e),
                }
                Ok(())
            }
        }
    }

    /// Send a sync message to the client
    async fn send_message(&mut self, message: &SyncMessage) -> Result<(), SendError> {
        let json = message.encode()?;
        self.sender.send(Message::Text(json)).await?;
        Ok(())
    }
}

/// Create and handle a new WebSocket session
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState) {
    let session_id = state.next_session_id();
    let session = WebSocketSession::new(socket, state, session_id);
    session.handle().await;
}
