//! # System Lifecycle & Orchestration
//!
//! Starting, wiring and stopping the platform's actors.
//!
//! Actors are created first and receive their dependencies when started, so the order actor
//! can price carts through the restaurant actor without either knowing how the other was
//! built:
//!
//! ```rust,ignore
//! let (restaurant_actor, restaurant_client) = restaurant_actor::with_store(..);
//! let (order_actor, order_client) = order_actor::with_store(..);
//!
//! tokio::spawn(restaurant_actor.run(()));
//! tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_client.clone())));
//! ```
//!
//! ## Shutdown
//!
//! 1. [`ShutdownHandle::trigger`] stops the maintenance task and ends open event streams.
//! 2. [`MenuPlatform::shutdown`] drops the platform's clients.
//! 3. The order actor exits once its last client is gone, dropping the restaurant client it
//!    held as context; the restaurant actor follows.
//!
//! The dependency graph is acyclic, so closing channels is enough to stop everything.

pub mod maintenance;
pub mod platform;
pub mod seed;
pub mod tracing;

pub use maintenance::*;
pub use platform::*;
pub use seed::*;
pub use self::tracing::*;
