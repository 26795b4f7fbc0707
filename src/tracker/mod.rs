//! # Order tracking for customer devices ("local mode")
//!
//! A client library for kiosks, apps and other Rust consumers of the API. It places orders
//! through an [`OrderBackend`] and keeps a local copy of each one in a [`LocalOrderStore`].
//!
//! When the API cannot be reached the order is queued locally instead of failing. The
//! customer keeps a tracked order, and [`OrderTracker::sync`] submits the queue once the API
//! answers again. Every order carries its local reference as `client_ref`, which the server
//! turns into a deterministic order id, so a submission that timed out after reaching the
//! server is never placed twice.
//!
//! ```rust,ignore
//! let backend = HttpOrderBackend::new("https://menu.example.com", Duration::from_secs(10))?;
//! let store = JsonLocalStore::new("orders.json");
//! let tracker = Arc::new(OrderTracker::open(backend, store, TrackerConfig::default()).await?);
//!
//! let tracked = tracker.place(slug, request).await?;   // works offline too
//! tokio::spawn({
//!     let tracker = tracker.clone();
//!     async move { tracker.run(shutdown).await }
//! });
//! ```

pub mod backend;
pub mod local_store;
pub mod order_tracker;

pub use backend::{BackendError, HttpOrderBackend, OrderBackend};
pub use local_store::{
    JsonLocalStore, LocalOrderStore, LocalStoreError, MemoryLocalStore, TrackState, TrackedOrder,
};
pub use order_tracker::{OrderTracker, SyncReport, TrackerConfig, TrackerError};
