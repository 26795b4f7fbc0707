//! # Order Actor
//!
//! Owns every order of every restaurant. Orders depend on restaurants (pricing), so the
//! actor runs with a [`RestaurantClient`](crate::clients::RestaurantClient) as its context:
//!
//! ```rust,ignore
//! let (restaurant_actor, restaurant_client) = restaurant_actor::new(32);
//! let (order_actor, order_client) = order_actor::new(32);
//!
//! tokio::spawn(restaurant_actor.run(()));
//! tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_client)));
//! ```
//!
//! Status changes go through [`OrderAction::Transition`], which enforces the lifecycle and
//! the optimistic version check.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::model::Order;
use resource_actor::{ResourceActor, ResourceClient, Store};

/// Creates an in-memory Order actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, ResourceClient<Order>) {
    ResourceActor::new(buffer_size)
}

/// Creates an Order actor persisted through `store`.
pub fn with_store(
    buffer_size: usize,
    event_buffer: usize,
    store: impl Store<Order>,
) -> (ResourceActor<Order>, ResourceClient<Order>) {
    ResourceActor::with_store(buffer_size, event_buffer, store)
}
