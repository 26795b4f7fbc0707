//! # Resource Actor
//!
//! Building blocks for type-safe, concurrent actor systems that manage collections of
//! resources. Each resource type (a restaurant, an order) gets one actor that owns its state
//! exclusively, writes every change through a pluggable [`Store`] and publishes committed
//! changes on a broadcast feed.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - business rules, as hooks on the entity type
//! 2. **Runtime Layer** ([`ResourceActor`]) - message loop, persistence, change feed
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - typed requests and subscriptions
//!
//! Business logic is written once, in the entity hooks. The actor owns the
//! message passing, draft/commit handling and error plumbing.
//!
//! ## Context Injection
//!
//! Dependencies are handed to [`ResourceActor::run`], not to the constructor. All actors are
//! created first, then each is started with the clients it needs. An order actor that prices
//! carts against the menu actor is started with the menu actor's client as its context.
//!
//! ## Consistency
//!
//! - Messages are processed **sequentially** within an actor, so writes to one entity are
//!   serialized without locks.
//! - A hook that fails, or a store that refuses a write, leaves the committed state untouched.
//! - Subscribers see events in commit order.
//!
//! ## Testing
//!
//! [`mock::MockClient`] answers a real `ResourceClient` from scripted expectations, so code
//! around a client can be tested without spawning the actors it talks to.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod store;

pub use actor::{ResourceActor, DEFAULT_EVENT_BUFFER};
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceEvent, ResourceRequest, Response};
pub use store::{MemoryStore, Store, StoreError};
