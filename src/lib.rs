//! # Menu Platform
//!
//! A multi-tenant restaurant menu and ordering service. Each restaurant gets its own
//! multilingual menu, theme, promotions and an admin area. Customers browse the menu and
//! place orders; the restaurant moves each order through its lifecycle and customers follow
//! it live.
//!
//! ## Architecture
//!
//! State lives in two resource actors built on [`resource_actor`]. Each owns its entities
//! and processes messages one at a time, so there are no locks around restaurants or orders.
//!
//! - **Restaurants** ([`restaurant_actor`]): profile, menu, theme, promotion, admin
//!   credentials. Prices carts for the order actor.
//! - **Orders** ([`order_actor`]): placement, optimistic-concurrency status transitions and
//!   history. Receives a [`RestaurantClient`](clients::RestaurantClient) as its context when
//!   started.
//!
//! Around them:
//!
//! - [`clients`]: typed wrappers hiding message passing behind domain methods and errors.
//! - [`storage`]: JSON-file persistence; actors hydrate from it at startup.
//! - [`auth`]: password hashing and admin sessions.
//! - [`http`]: the REST and Server-Sent Events API.
//! - [`lifecycle`]: wiring, seeding, maintenance and shutdown.
//! - [`tracker`]: client-side order tracking that keeps working while the API is
//!   unreachable ("local mode").
//!
//! ## Order lifecycle
//!
//! ```text
//! placed ──► accepted ──► completed
//!    │
//!    └─────► rejected
//! ```
//!
//! Every transition carries the version the caller last saw; a stale version is refused, so
//! two admin screens can never silently overwrite each other.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

pub mod auth;
pub mod clients;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod restaurant_actor;
pub mod storage;
pub mod tracker;
