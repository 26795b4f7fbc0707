//! # Observability & Tracing
//!
//! [`setup_tracing`] installs one compact `fmt` subscriber for the whole process. Filtering
//! follows `RUST_LOG`; without it the platform logs at `info`.
//!
//! ```bash
//! RUST_LOG=info cargo run                         # lifecycle and per-operation events
//! RUST_LOG=debug cargo run                        # plus every request sent to an actor
//! RUST_LOG=info,tower_http=debug cargo run        # plus one span per HTTP request
//! ```
//!
//! Actors log with an `entity_type` field instead of a module path, which is why targets are
//! hidden:
//!
//! ```text
//! INFO Hydrated entity_type="Restaurant" size=3
//! INFO place_order{restaurant=Slug("chez-test") lines=2}: Created entity_type="Order" id=6f1c... size=12
//! INFO transition{id=6f1c... to=Accepted expected_version=Some(1)}: Order status changed status=accepted version=2
//! ```
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

pub fn setup_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
