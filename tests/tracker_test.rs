//! Order tracking on a customer device against the real platform, online and offline.

mod common;

use async_trait::async_trait;
use common::{cart, memory_settings, new_restaurant};
use menu_platform::clients::OrderClient;
use menu_platform::http::{self, AppState};
use menu_platform::lifecycle::MenuPlatform;
use menu_platform::model::{Order, OrderId, OrderStatus, PlaceOrderRequest, Slug};
use menu_platform::order_actor::OrderError;
use menu_platform::tracker::{
    BackendError, HttpOrderBackend, JsonLocalStore, MemoryLocalStore, OrderBackend, OrderTracker,
    TrackState, TrackerConfig, TrackerError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// In-process backend with a switch standing in for the network.
#[derive(Clone)]
struct SwitchedBackend {
    orders: OrderClient,
    online: Arc<AtomicBool>,
}

impl SwitchedBackend {
    fn new(orders: OrderClient) -> Self {
        Self {
            orders,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unreachable("network down".into()))
        }
    }
}

fn backend_error(e: OrderError) -> BackendError {
    match e {
        OrderError::NotFound(_) => BackendError::NotFound,
        OrderError::ActorCommunicationError(msg) => BackendError::Server {
            status: 503,
            message: msg,
        },
        other => BackendError::Rejected {
            status: 409,
            kind: "rejected".into(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl OrderBackend for SwitchedBackend {
    async fn place_order(
        &self,
        restaurant: &Slug,
        request: &PlaceOrderRequest,
    ) -> Result<Order, BackendError> {
        self.check()?;
        self.orders
            .place_order(restaurant.clone(), request.clone())
            .await
            .map_err(backend_error)
    }

    async fn fetch_order(&self, _restaurant: &Slug, id: OrderId) -> Result<Order, BackendError> {
        self.check()?;
        self.orders.fetch(id).await.map_err(backend_error)
    }
}

#[tokio::test]
async fn offline_orders_reach_the_kitchen_once_back_online() {
    let platform = MenuPlatform::start(&memory_settings()).await.unwrap();
    let slug = platform
        .restaurants
        .create_restaurant(new_restaurant("chez-test"))
        .await
        .unwrap();

    let device = TempDir::new().unwrap();
    let store_path = device.path().join("orders.json");
    let backend = SwitchedBackend::new(platform.orders.clone());

    backend.set_online(false);
    let tracker = OrderTracker::open(
        backend.clone(),
        JsonLocalStore::new(&store_path),
        TrackerConfig::default(),
    )
    .await
    .unwrap();
    let queued = tracker
        .place(slug.clone(), cart(&[("soup", 1), ("salad", 1)]))
        .await
        .unwrap();
    assert_eq!(queued.state, TrackState::PendingSubmission);
    assert!(tracker.is_local_mode().await);
    drop(tracker);

    // The app restarts while still offline: the queue comes back from disk.
    let tracker = OrderTracker::open(
        backend.clone(),
        JsonLocalStore::new(&store_path),
        TrackerConfig::default(),
    )
    .await
    .unwrap();
    assert!(tracker.get(&queued.local_ref).await.unwrap().is_pending());

    backend.set_online(true);
    let report = tracker.sync().await.unwrap();
    assert_eq!(report.submitted, 1);
    assert_eq!(report.pending, 0);

    let submitted = tracker.get(&queued.local_ref).await.unwrap();
    let remote = submitted.remote.clone().unwrap();
    assert_eq!(remote.total_cents, 650 + 800);
    assert_eq!(remote.client_ref.as_deref(), Some(queued.local_ref.as_str()));
    assert_eq!(
        remote.id,
        OrderId::for_client_ref(&slug, &queued.local_ref)
    );

    // The kitchen accepts; the device catches up on the next sync.
    platform
        .orders
        .transition(remote.id, OrderStatus::Accepted, Some(1), None)
        .await
        .unwrap();
    let report = tracker.sync().await.unwrap();
    assert_eq!(report.refreshed, 1);
    assert_eq!(
        tracker.get(&queued.local_ref).await.unwrap().status(),
        Some(OrderStatus::Accepted)
    );

    drop(tracker);
    drop(backend);
    platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn orders_the_menu_no_longer_allows_are_abandoned() {
    let platform = MenuPlatform::start(&memory_settings()).await.unwrap();
    let slug = platform
        .restaurants
        .create_restaurant(new_restaurant("chez-test"))
        .await
        .unwrap();
    let backend = SwitchedBackend::new(platform.orders.clone());
    let tracker = OrderTracker::open(
        backend.clone(),
        MemoryLocalStore::new(),
        TrackerConfig::default(),
    )
    .await
    .unwrap();

    backend.set_online(false);
    let steak = tracker.place(slug.clone(), cart(&[("steak", 1)])).await.unwrap();
    let soup = tracker.place(slug.clone(), cart(&[("soup", 1)])).await.unwrap();

    // Sold out while the device was offline.
    platform
        .restaurants
        .set_item_availability(slug.clone(), "steak".into(), false)
        .await
        .unwrap();
    backend.set_online(true);

    let report = tracker.sync().await.unwrap();
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.submitted, 1);
    assert!(matches!(
        tracker.get(&steak.local_ref).await.unwrap().state,
        TrackState::Abandoned { .. }
    ));
    assert_eq!(
        tracker.get(&soup.local_ref).await.unwrap().state,
        TrackState::Submitted
    );
    assert_eq!(tracker.forget_finished().await.unwrap(), 1);

    drop(tracker);
    drop(backend);
    platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn http_backend_against_a_running_server() {
    let settings = memory_settings();
    let platform = MenuPlatform::start(&settings).await.unwrap();
    let slug = platform
        .restaurants
        .create_restaurant(new_restaurant("chez-test"))
        .await
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = http::router(AppState::new(&platform, &settings), &settings.server);
    let shutdown = platform.shutdown_handle();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.triggered().await })
            .await
            .unwrap();
    });

    let backend = HttpOrderBackend::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let tracker = OrderTracker::open(
        backend.clone(),
        MemoryLocalStore::new(),
        TrackerConfig::default(),
    )
    .await
    .unwrap();

    let tracked = tracker.place(slug.clone(), cart(&[("soup", 2)])).await.unwrap();
    assert_eq!(tracked.state, TrackState::Submitted);
    let remote = tracked.remote.unwrap();
    assert_eq!(remote.total_cents, 1300);

    let fetched = backend.fetch_order(&slug, remote.id).await.unwrap();
    assert_eq!(fetched, remote);
    assert_eq!(
        backend.fetch_order(&slug, OrderId::random()).await,
        Err(BackendError::NotFound)
    );

    // Permanent refusals come back with the API's error kind.
    let err = tracker
        .place(slug.clone(), cart(&[("caviar", 1)]))
        .await
        .unwrap_err();
    match err {
        TrackerError::Rejected(BackendError::Rejected { status, kind, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(kind, "validation");
        }
        other => panic!("unexpected {other:?}"),
    }
    let err = backend
        .place_order(&Slug::parse("nowhere").unwrap(), &cart(&[("soup", 1)]))
        .await
        .unwrap_err();
    assert!(!err.is_transient());

    // Server gone: new orders are kept locally.
    platform.shutdown_handle().trigger();
    server.await.unwrap();
    let queued = tracker.place(slug.clone(), cart(&[("soup", 1)])).await.unwrap();
    assert!(queued.is_pending(), "{queued:?}");
    assert!(tracker.sync().await.unwrap().offline);

    drop(tracker);
    platform.shutdown().await.unwrap();
}
