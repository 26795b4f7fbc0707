//! Device-side persistence of tracked orders.

use crate::model::{Order, OrderStatus, PlaceOrderRequest, Slug};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt local order file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackState {
    /// Queued on the device, not yet accepted by the server.
    PendingSubmission,
    /// Known to the server; `remote` holds its latest state.
    Submitted,
    /// The server refused the order for good.
    Abandoned { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
    /// Device-chosen reference, sent as `client_ref`.
    pub local_ref: String,
    pub restaurant: Slug,
    pub request: PlaceOrderRequest,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: TrackState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<Order>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl TrackedOrder {
    pub fn is_pending(&self) -> bool {
        self.state == TrackState::PendingSubmission
    }

    /// Server status, if the server knows the order.
    pub fn status(&self) -> Option<OrderStatus> {
        self.remote.as_ref().map(|order| order.status)
    }

    /// Nothing more will happen to this order.
    pub fn is_settled(&self) -> bool {
        match self.state {
            TrackState::Abandoned { .. } => true,
            TrackState::Submitted => self.status().is_some_and(OrderStatus::is_terminal),
            TrackState::PendingSubmission => false,
        }
    }
}

/// Where a device keeps its tracked orders. The whole list is saved at once.
#[async_trait]
pub trait LocalOrderStore: Send + Sync {
    async fn load(&self) -> Result<Vec<TrackedOrder>, LocalStoreError>;
    async fn save_all(&self, orders: &[TrackedOrder]) -> Result<(), LocalStoreError>;
}

/// Volatile store, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    orders: Arc<Mutex<Vec<TrackedOrder>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Vec<TrackedOrder> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl LocalOrderStore for MemoryLocalStore {
    async fn load(&self) -> Result<Vec<TrackedOrder>, LocalStoreError> {
        Ok(self.orders.lock().await.clone())
    }

    async fn save_all(&self, orders: &[TrackedOrder]) -> Result<(), LocalStoreError> {
        *self.orders.lock().await = orders.to_vec();
        Ok(())
    }
}

/// One JSON file holding the whole list, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonLocalStore {
    path: PathBuf,
}

impl JsonLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LocalStoreError {
        LocalStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LocalOrderStore for JsonLocalStore {
    async fn load(&self) -> Result<Vec<TrackedOrder>, LocalStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save_all(&self, orders: &[TrackedOrder]) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let bytes = serde_json::to_vec_pretty(orders)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), count = orders.len(), "Saved tracked orders");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartLine;
    use tempfile::TempDir;

    fn pending(local_ref: &str) -> TrackedOrder {
        TrackedOrder {
            local_ref: local_ref.into(),
            restaurant: Slug::parse("chez-test").unwrap(),
            request: PlaceOrderRequest {
                lines: vec![CartLine {
                    item_id: "soup".into(),
                    quantity: 2,
                }],
                client_ref: Some(local_ref.into()),
                ..Default::default()
            },
            created_at: Utc::now(),
            state: TrackState::PendingSubmission,
            remote: None,
            attempts: 1,
            last_error: Some("Backend unreachable".into()),
        }
    }

    #[tokio::test]
    async fn json_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("device").join("orders.json");

        let store = JsonLocalStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());

        let mut abandoned = pending("b");
        abandoned.state = TrackState::Abandoned {
            reason: "item gone".into(),
        };
        store.save_all(&[pending("a"), abandoned]).await.unwrap();

        let reopened = JsonLocalStore::new(&path).load().await.unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened[0], pending_with_time(&reopened[0], "a"));
        assert!(reopened[1].is_settled());
        assert!(!path.with_extension("json.tmp").exists());
    }

    fn pending_with_time(loaded: &TrackedOrder, local_ref: &str) -> TrackedOrder {
        TrackedOrder {
            created_at: loaded.created_at,
            ..pending(local_ref)
        }
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("orders.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonLocalStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, LocalStoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn memory_store_is_shared_between_clones() {
        let store = MemoryLocalStore::new();
        store.clone().save_all(&[pending("a")]).await.unwrap();
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[test]
    fn pending_orders_are_never_settled() {
        let order = pending("a");
        assert!(order.is_pending());
        assert!(!order.is_settled());
        assert_eq!(order.status(), None);
    }
}
