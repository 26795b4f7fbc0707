//! The tracker itself: places orders, queues them while offline and keeps them in sync.

use super::backend::{BackendError, OrderBackend};
use super::local_store::{LocalOrderStore, LocalStoreError, TrackState, TrackedOrder};
use crate::model::{PlaceOrderRequest, Slug};
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Order rejected: {0}")]
    Rejected(BackendError),
    #[error("Invalid order: {0}")]
    Invalid(String),
    #[error("Local storage error: {0}")]
    Storage(#[from] LocalStoreError),
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Pause between two syncs while the backend answers.
    pub poll_interval: Duration,
    /// Upper bound of the pause while offline.
    pub max_backoff: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Outcome of one [`OrderTracker::sync`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Queued orders the server accepted.
    pub submitted: usize,
    /// Queued orders the server refused for good.
    pub abandoned: usize,
    /// Submitted orders whose server state moved on.
    pub refreshed: usize,
    /// The backend could not be reached.
    pub offline: bool,
    /// Orders still waiting for submission.
    pub pending: usize,
}

/// Places and follows the orders of one device.
///
/// The order list lives behind one lock, which is held across backend calls so `place` and
/// `sync` never submit the same order concurrently. Orders are kept in creation order.
pub struct OrderTracker<B, S> {
    backend: B,
    store: S,
    orders: Mutex<Vec<TrackedOrder>>,
    config: TrackerConfig,
}

impl<B, S> OrderTracker<B, S>
where
    B: OrderBackend,
    S: LocalOrderStore,
{
    /// Restores the orders saved by a previous run.
    pub async fn open(backend: B, store: S, config: TrackerConfig) -> Result<Self, TrackerError> {
        let orders = store.load().await?;
        let pending = orders.iter().filter(|o| o.is_pending()).count();
        info!(tracked = orders.len(), pending, "Order tracker opened");
        Ok(Self {
            backend,
            store,
            orders: Mutex::new(orders),
            config,
        })
    }

    /// Places an order, or queues it when the backend is unreachable.
    ///
    /// While older orders are still queued the new one is queued behind them, so the server
    /// sees orders in the order they were placed. Placing again with a `client_ref` that is
    /// already tracked returns the tracked order.
    #[instrument(skip(self, restaurant, request), fields(restaurant = %restaurant))]
    pub async fn place(
        &self,
        restaurant: Slug,
        mut request: PlaceOrderRequest,
    ) -> Result<TrackedOrder, TrackerError> {
        request.validate().map_err(TrackerError::Invalid)?;
        if request.lines.is_empty() {
            return Err(TrackerError::Invalid("an order needs at least one line".into()));
        }
        let local_ref = request
            .client_ref
            .get_or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();

        let mut orders = self.orders.lock().await;
        if let Some(existing) = orders.iter().find(|o| o.local_ref == local_ref) {
            debug!(%local_ref, "Order already tracked");
            return Ok(existing.clone());
        }

        let mut tracked = TrackedOrder {
            local_ref: local_ref.clone(),
            restaurant,
            request,
            created_at: Utc::now(),
            state: TrackState::PendingSubmission,
            remote: None,
            attempts: 0,
            last_error: None,
        };

        if orders.iter().any(TrackedOrder::is_pending) {
            info!(%local_ref, "Local mode: queued behind earlier orders");
        } else {
            tracked.attempts = 1;
            match self
                .backend
                .place_order(&tracked.restaurant, &tracked.request)
                .await
            {
                Ok(order) => {
                    info!(%local_ref, order_id = %order.id, "Order submitted");
                    tracked.state = TrackState::Submitted;
                    tracked.remote = Some(order);
                }
                Err(e) if e.is_transient() => {
                    warn!(%local_ref, error = %e, "No confirmation from backend, order kept locally");
                    tracked.last_error = Some(e.to_string());
                }
                Err(e) => {
                    warn!(%local_ref, error = %e, "Order rejected");
                    return Err(TrackerError::Rejected(e));
                }
            }
        }

        // Memory only changes once the device copy is written.
        let mut next = orders.clone();
        next.push(tracked.clone());
        self.store.save_all(&next).await?;
        *orders = next;
        Ok(tracked)
    }

    /// Submits queued orders, then refreshes the submitted ones that are still open.
    ///
    /// Submission stops at the first transient failure. A refreshed order only replaces the
    /// local copy when its version is not older.
    pub async fn sync(&self) -> Result<SyncReport, TrackerError> {
        let mut orders = self.orders.lock().await;
        let mut report = SyncReport::default();

        for tracked in orders.iter_mut().filter(|o| o.is_pending()) {
            tracked.attempts += 1;
            match self
                .backend
                .place_order(&tracked.restaurant, &tracked.request)
                .await
            {
                Ok(order) => {
                    info!(local_ref = %tracked.local_ref, order_id = %order.id, "Queued order submitted");
                    tracked.state = TrackState::Submitted;
                    tracked.remote = Some(order);
                    tracked.last_error = None;
                    report.submitted += 1;
                }
                Err(e) if e.is_transient() => {
                    debug!(local_ref = %tracked.local_ref, error = %e, "Still offline");
                    tracked.last_error = Some(e.to_string());
                    report.offline = true;
                    break;
                }
                Err(e) => {
                    warn!(local_ref = %tracked.local_ref, error = %e, "Queued order abandoned");
                    tracked.state = TrackState::Abandoned {
                        reason: e.to_string(),
                    };
                    tracked.last_error = Some(e.to_string());
                    report.abandoned += 1;
                }
            }
        }

        if !report.offline {
            for tracked in orders.iter_mut() {
                let (id, version) = match &tracked.remote {
                    Some(local) if !local.is_finished() => (local.id, local.version),
                    _ => continue,
                };
                match self.backend.fetch_order(&tracked.restaurant, id).await {
                    Ok(order) if order.version >= version => {
                        if order.version > version {
                            debug!(order_id = %order.id, status = %order.status, "Order moved on");
                            report.refreshed += 1;
                        }
                        tracked.remote = Some(order);
                        tracked.last_error = None;
                    }
                    Ok(stale) => {
                        debug!(order_id = %stale.id, version = stale.version, "Ignoring older server state");
                    }
                    Err(e) if e.is_transient() => {
                        report.offline = true;
                        break;
                    }
                    Err(e) => {
                        tracked.last_error = Some(e.to_string());
                    }
                }
            }
        }

        report.pending = orders.iter().filter(|o| o.is_pending()).count();
        self.store.save_all(&orders).await?;
        Ok(report)
    }

    /// Syncs every `poll_interval` until `shutdown` resolves, doubling the pause up to
    /// `max_backoff` while offline.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut delay = self.config.poll_interval;
        info!(interval = ?delay, "Order tracker sync loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = match self.sync().await {
                Ok(report) if report.offline => {
                    let next = (delay * 2).min(self.config.max_backoff);
                    warn!(pending = report.pending, retry_in = ?next, "Local mode: backend unreachable");
                    next
                }
                Ok(report) => {
                    if report.submitted + report.abandoned + report.refreshed > 0 {
                        info!(?report, "Orders synced");
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    error!(error = %e, "Order sync failed");
                    (delay * 2).min(self.config.max_backoff)
                }
            };
        }
        info!("Order tracker sync loop stopped");
    }

    pub async fn orders(&self) -> Vec<TrackedOrder> {
        self.orders.lock().await.clone()
    }

    pub async fn get(&self, local_ref: &str) -> Option<TrackedOrder> {
        self.orders
            .lock()
            .await
            .iter()
            .find(|o| o.local_ref == local_ref)
            .cloned()
    }

    /// Some orders only exist on this device.
    pub async fn is_local_mode(&self) -> bool {
        self.orders.lock().await.iter().any(TrackedOrder::is_pending)
    }

    /// Drops completed, rejected and abandoned orders.
    pub async fn forget_finished(&self) -> Result<usize, TrackerError> {
        let mut orders = self.orders.lock().await;
        let before = orders.len();
        orders.retain(|o| !o.is_settled());
        let removed = before - orders.len();
        if removed > 0 {
            self.store.save_all(&orders).await?;
        }
        Ok(removed)
    }
}
