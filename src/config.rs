//! Configuration for documents and the sync host.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::crdt::types::ReplicaId;
use crate::error::{Result, SyncError};

/// Per-document settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Pinned replica id; a random one is drawn when absent
    pub replica_id: Option<ReplicaId>,
    /// How long an operation may wait for a missing dependency before it is
    /// reported as `MissingDependency`
    pub pending_timeout_ms: u64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            replica_id: None,
            pending_timeout_ms: 5_000,
        }
    }
}

impl DocumentConfig {
    /// Config with a fixed replica id and default limits.
    pub fn with_replica(replica_id: ReplicaId) -> Self {
        DocumentConfig {
            replica_id: Some(replica_id),
            ..Self::default()
        }
    }

    pub fn pending_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.pending_timeout_ms).unwrap_or(i64::MAX))
    }
}

/// Settings of the websocket sync host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Capacity of the relay channel between sessions
    pub channel_capacity: usize,
    pub document: DocumentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            channel_capacity: 256,
            document: DocumentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads a JSON config file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SyncError::Config(e.to_string()))
    }
}
