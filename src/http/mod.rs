//! # HTTP API
//!
//! REST endpoints for customers and restaurant admins, plus Server-Sent Events streams that
//! replace polling: a customer follows one order, an admin follows every order of their
//! restaurant.
//!
//! | Area | Module |
//! |------|--------|
//! | menu browsing, ordering, order status | [`public`] |
//! | restaurant registration, admin login, menu and order management | [`admin`] |
//! | change feeds | [`events`] |
//!
//! Errors are JSON `{"error": kind, "message": text}`, see [`ApiError`].

pub mod admin;
pub mod auth;
pub mod error;
pub mod events;
pub mod health;
pub mod public;

pub use auth::AdminSession;
pub use error::{ApiError, ErrorResponse};

use crate::auth::SessionStore;
use crate::clients::{OrderClient, RestaurantClient};
use crate::config::{Settings, ServerConfig};
use crate::lifecycle::{MenuPlatform, ShutdownHandle};
use crate::model::Slug;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Header carrying the platform key on `POST /api/restaurants`.
pub const PLATFORM_KEY_HEADER: &str = "x-platform-key";

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub restaurants: RestaurantClient,
    pub orders: OrderClient,
    pub sessions: SessionStore,
    pub platform_key: Option<Arc<str>>,
    pub shutdown: ShutdownHandle,
}

impl AppState {
    pub fn new(platform: &MenuPlatform, settings: &Settings) -> Self {
        Self {
            restaurants: platform.restaurants.clone(),
            orders: platform.orders.clone(),
            sessions: platform.sessions.clone(),
            platform_key: settings.admin.platform_key.as_deref().map(Arc::from),
            shutdown: platform.shutdown_handle(),
        }
    }
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Customer
        .route("/api/restaurants/{slug}", get(public::get_restaurant))
        .route("/api/restaurants/{slug}/menu", get(public::get_menu))
        .route("/api/restaurants/{slug}/orders", post(public::place_order))
        .route("/api/restaurants/{slug}/orders/{id}", get(public::get_order))
        .route(
            "/api/restaurants/{slug}/orders/{id}/events",
            get(events::order_events),
        )
        // Admin
        .route("/api/restaurants", post(admin::create_restaurant))
        .route("/api/restaurants/{slug}/admin", get(admin::get_restaurant))
        .route("/api/restaurants/{slug}/admin/login", post(admin::login))
        .route("/api/restaurants/{slug}/admin/logout", post(admin::logout))
        .route("/api/restaurants/{slug}/admin/menu", put(admin::replace_menu))
        .route(
            "/api/restaurants/{slug}/admin/items/{item_id}/availability",
            put(admin::set_item_availability),
        )
        .route("/api/restaurants/{slug}/admin/theme", put(admin::set_theme))
        .route("/api/restaurants/{slug}/admin/info", put(admin::set_info))
        .route(
            "/api/restaurants/{slug}/admin/promotion",
            put(admin::set_promotion).delete(admin::clear_promotion),
        )
        .route("/api/restaurants/{slug}/admin/ordering", put(admin::set_ordering))
        .route("/api/restaurants/{slug}/admin/password", put(admin::change_password))
        .route("/api/restaurants/{slug}/admin/orders", get(admin::list_orders))
        .route(
            "/api/restaurants/{slug}/admin/orders/events",
            get(events::admin_order_events),
        )
        .route(
            "/api/restaurants/{slug}/admin/orders/{id}",
            patch(admin::update_order),
        )
        .route(
            "/api/restaurants/{slug}/admin/orders/{id}/status",
            put(admin::transition_order),
        )
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if server.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(PLATFORM_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60))
}

/// Parses the `{slug}` path segment.
pub(crate) fn parse_slug(raw: &str) -> Result<Slug, ApiError> {
    // A malformed slug can never name a restaurant.
    Slug::parse(raw).map_err(|_| ApiError::NotFound(format!("Restaurant not found: {raw}")))
}
