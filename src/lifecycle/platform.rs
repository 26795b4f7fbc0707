use crate::auth::SessionStore;
use crate::clients::{OrderClient, RestaurantClient};
use crate::config::Settings;
use crate::lifecycle::{maintenance, seed};
use crate::model::{Order, Restaurant};
use crate::storage::JsonFileStore;
use crate::{order_actor, restaurant_actor};
use resource_actor::{MemoryStore, ResourceActor, ResourceClient, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Seeding failed: {0}")]
    Seed(#[from] seed::SeedError),
    #[error("Task failed: {0}")]
    Task(String),
}

/// Broadcasts the end of the process to long-running tasks and open event streams.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Resolves once [`ShutdownHandle::trigger`] has been called.
    pub async fn triggered(&self) {
        let mut rx = self.subscribe();
        // An error means the sender is gone, which we treat as a shutdown too.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The running platform: both actors, the session store and the maintenance task.
///
/// # Example
///
/// ```ignore
/// let platform = MenuPlatform::start(&settings).await?;
///
/// let slug = platform.restaurants.create_restaurant(new_restaurant).await?;
/// let order = platform.orders.place_order(slug, request).await?;
///
/// platform.shutdown().await?;
/// ```
pub struct MenuPlatform {
    pub restaurants: RestaurantClient,
    pub orders: OrderClient,
    pub sessions: SessionStore,
    shutdown: ShutdownHandle,
    maintenance: JoinHandle<()>,
    handles: Vec<JoinHandle<()>>,
}

impl MenuPlatform {
    /// Builds the stores, hydrates and starts both actors, seeds restaurants and starts the
    /// maintenance task.
    pub async fn start(settings: &Settings) -> Result<Self, PlatformError> {
        let buffer = settings.actors.buffer;
        let event_buffer = settings.actors.event_buffer;

        // 1. Create actors over their stores (no dependencies yet)
        let (mut restaurant_actor, restaurant_client, mut order_actor, order_client) =
            match &settings.storage.data_dir {
                Some(dir) => {
                    info!(data_dir = %dir.display(), "Using JSON file storage");
                    let restaurants = JsonFileStore::<Restaurant>::open(dir, "restaurants").await?;
                    let orders = JsonFileStore::<Order>::open(dir, "orders").await?;
                    let (ra, rc) = restaurant_actor::with_store(buffer, event_buffer, restaurants);
                    let (oa, oc) = order_actor::with_store(buffer, event_buffer, orders);
                    (ra, rc, oa, oc)
                }
                None => {
                    info!("No data directory configured, state is kept in memory only");
                    let (ra, rc) = restaurant_actor::with_store(buffer, event_buffer, MemoryStore);
                    let (oa, oc) = order_actor::with_store(buffer, event_buffer, MemoryStore);
                    (ra, rc, oa, oc)
                }
            };

        // 2. Load persisted state before accepting requests
        restaurant_actor.hydrate().await?;
        order_actor.hydrate().await?;

        // 3. Start actors with injected context
        let platform = Self::spawn(
            restaurant_actor,
            restaurant_client,
            order_actor,
            order_client,
            settings,
        );

        if let Some(path) = &settings.seed.file {
            if let Err(e) = seed::seed_restaurants(&platform.restaurants, path).await {
                error!(error = %e, "Seeding failed, stopping");
                let _ = platform.shutdown().await;
                return Err(e.into());
            }
        }

        info!("Platform started");
        Ok(platform)
    }

    fn spawn(
        restaurant_actor: ResourceActor<Restaurant>,
        restaurant_client: ResourceClient<Restaurant>,
        order_actor: ResourceActor<Order>,
        order_client: ResourceClient<Order>,
        settings: &Settings,
    ) -> Self {
        let restaurants = RestaurantClient::new(restaurant_client);
        let orders = OrderClient::new(order_client);
        let sessions = SessionStore::new(settings.session_ttl());
        let shutdown = ShutdownHandle::new();

        // Restaurants have no dependencies (Context = ())
        let restaurant_handle = tokio::spawn(restaurant_actor.run(()));
        // Orders price carts through the restaurant actor (Context = RestaurantClient)
        let order_handle = tokio::spawn(order_actor.run(restaurants.clone()));

        let maintenance = maintenance::spawn(
            orders.clone(),
            sessions.clone(),
            settings.retention(),
            settings.maintenance_interval(),
            shutdown.clone(),
        );

        Self {
            restaurants,
            orders,
            sessions,
            shutdown,
            maintenance,
            handles: vec![order_handle, restaurant_handle],
        }
    }

    /// Signal shared with the HTTP layer.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Stops the maintenance task, drops the clients and waits for both actors.
    ///
    /// Clones of the clients held elsewhere (a router that is still serving) keep the actors
    /// alive; drop them first.
    pub async fn shutdown(self) -> Result<(), PlatformError> {
        info!("Shutting down platform...");
        self.shutdown.trigger();
        if let Err(e) = self.maintenance.await {
            error!(error = %e, "Maintenance task failed");
        }

        // Closing the channels is what stops the actors.
        drop(self.orders);
        drop(self.restaurants);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(PlatformError::Task(e.to_string()));
            }
        }

        info!("Platform shutdown complete.");
        Ok(())
    }
}
