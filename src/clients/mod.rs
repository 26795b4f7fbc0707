//! Type-safe wrappers around [`ResourceClient`](resource_actor::ResourceClient).
//!
//! The rest of the crate (HTTP handlers, the order actor, the maintenance task) only talks to
//! the actors through these clients, and only sees the typed domain errors.

pub mod order_client;
pub mod restaurant_client;

pub use order_client::*;
pub use restaurant_client::*;
