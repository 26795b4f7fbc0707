//! # Restaurant Actor
//!
//! Owns every tenant record: info, theme, menu, promotion, ordering switch and the admin
//! password hash. Besides plain updates it exposes the [`RestaurantAction`]s menu editing
//! needs, plus `QuoteCart`, the read-only pricing the order actor relies on.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](resource_actor::ActorEntity) implementation for
//!   [`Restaurant`]
//! - [`error`] - [`RestaurantError`]
//! - [`actions`] - [`RestaurantAction`] and [`RestaurantActionResult`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (actor, generic_client) = restaurant_actor::new(32);
//! let client = RestaurantClient::new(generic_client);
//! tokio::spawn(actor.run(()));
//!
//! let slug = client.create_restaurant(new_restaurant).await?;
//! let quote = client.quote_cart(slug, lines).await?;
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::RestaurantQuery;
pub use error::*;

use crate::model::Restaurant;
use resource_actor::{ResourceActor, ResourceClient, Store};

/// Creates an in-memory Restaurant actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Restaurant>, ResourceClient<Restaurant>) {
    ResourceActor::new(buffer_size)
}

/// Creates a Restaurant actor persisted through `store`.
pub fn with_store(
    buffer_size: usize,
    event_buffer: usize,
    store: impl Store<Restaurant>,
) -> (ResourceActor<Restaurant>, ResourceClient<Restaurant>) {
    ResourceActor::with_store(buffer_size, event_buffer, store)
}
