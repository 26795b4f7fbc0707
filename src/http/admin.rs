//! Admin endpoints: registration (platform key) and everything behind an admin session.

use super::public::{find_order, parse_order_path};
use super::{parse_slug, AdminSession, ApiError, AppState, PLATFORM_KEY_HEADER};
use crate::model::{
    Menu, NewRestaurant, Order, OrderQuery, OrderStatus, OrderUpdate, Promotion,
    RestaurantInfo, RestaurantUpdate, RestaurantView, Slug, Theme,
};
use crate::restaurant_actor::RestaurantError;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct OrderingRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub order: Order,
    pub changed: bool,
}

/// `?status=placed,accepted&since=2024-05-01T12:00:00Z`
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub since: Option<String>,
}

impl OrdersQuery {
    fn into_query(self, slug: Slug) -> Result<OrderQuery, ApiError> {
        let mut query = OrderQuery::for_restaurant(slug);
        if let Some(statuses) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query.statuses = statuses
                .split(',')
                .map(|s| s.trim().parse::<OrderStatus>())
                .collect::<Result<_, _>>()
                .map_err(ApiError::BadRequest)?;
        }
        if let Some(since) = self.since.as_deref() {
            let since = DateTime::parse_from_rfc3339(since)
                .map_err(|e| ApiError::BadRequest(format!("invalid since: {e}")))?;
            query.updated_since = Some(since.with_timezone(&Utc));
        }
        Ok(query)
    }
}

// =============================================================================
// Registration and sessions
// =============================================================================

#[instrument(skip_all)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: JsonBody<NewRestaurant>,
) -> Result<(StatusCode, Json<RestaurantView>), ApiError> {
    let expected = state
        .platform_key
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("restaurant registration is disabled".into()))?;
    let provided = headers
        .get(PLATFORM_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !keys_match(provided, expected) {
        return Err(ApiError::Unauthorized("invalid platform key".into()));
    }

    let Json(params) = body?;
    let slug = state.restaurants.create_restaurant(params).await?;
    let restaurant = state.restaurants.fetch(&slug).await?;
    Ok((StatusCode::CREATED, Json(restaurant.admin_view())))
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let slug = parse_slug(&slug)?;
    let Json(LoginRequest { password }) = body?;

    match state.restaurants.verify_admin(slug.clone(), password).await {
        Ok(()) => {}
        // Same answer for unknown restaurants and wrong passwords.
        Err(RestaurantError::NotFound(_)) | Err(RestaurantError::Unauthorized) => {
            return Err(ApiError::Unauthorized("invalid credentials".into()));
        }
        Err(e) => return Err(e.into()),
    }

    let (token, session) = state.sessions.issue(slug);
    info!(restaurant = %session.restaurant, "Admin logged in");
    Ok(Json(LoginResponse {
        token,
        expires_at: session.expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    session.authorize(&slug)?;
    state.sessions.revoke(&session.token);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<PasswordChangeRequest>,
) -> Result<StatusCode, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(request) = body?;

    state
        .restaurants
        .verify_admin(slug.clone(), request.current_password)
        .await
        .map_err(|e| match e {
            RestaurantError::Unauthorized => {
                ApiError::Unauthorized("current password is wrong".into())
            }
            other => other.into(),
        })?;
    state
        .restaurants
        .change_password(slug.clone(), request.new_password)
        .await?;

    let revoked = state.sessions.revoke_restaurant(&slug);
    info!(%slug, revoked, "Password changed, sessions revoked");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Restaurant management
// =============================================================================

pub async fn get_restaurant(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    Ok(Json(state.restaurants.fetch(&slug).await?.admin_view()))
}

pub async fn replace_menu(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<Menu>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(menu) = body?;
    state.restaurants.replace_menu(slug.clone(), menu).await?;
    current_view(&state, &slug).await
}

pub async fn set_item_availability(
    State(state): State<AppState>,
    session: AdminSession,
    Path((slug, item_id)): Path<(String, String)>,
    body: JsonBody<AvailabilityRequest>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(AvailabilityRequest { available }) = body?;
    state
        .restaurants
        .set_item_availability(slug.clone(), item_id, available)
        .await?;
    current_view(&state, &slug).await
}

pub async fn set_theme(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<Theme>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(theme) = body?;
    update(&state, slug, RestaurantUpdate {
        theme: Some(theme),
        ..Default::default()
    })
    .await
}

pub async fn set_info(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<RestaurantInfo>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(info) = body?;
    update(&state, slug, RestaurantUpdate {
        info: Some(info),
        ..Default::default()
    })
    .await
}

pub async fn set_ordering(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<OrderingRequest>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(OrderingRequest { enabled }) = body?;
    update(&state, slug, RestaurantUpdate {
        ordering_enabled: Some(enabled),
        ..Default::default()
    })
    .await
}

pub async fn set_promotion(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    body: JsonBody<Promotion>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    let Json(promotion) = body?;
    state
        .restaurants
        .set_promotion(slug.clone(), Some(promotion))
        .await?;
    current_view(&state, &slug).await
}

pub async fn clear_promotion(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
) -> Result<Json<RestaurantView>, ApiError> {
    let slug = session.authorize(&slug)?;
    state.restaurants.set_promotion(slug.clone(), None).await?;
    current_view(&state, &slug).await
}

async fn update(
    state: &AppState,
    slug: Slug,
    update: RestaurantUpdate,
) -> Result<Json<RestaurantView>, ApiError> {
    let restaurant = state.restaurants.update_restaurant(slug, update).await?;
    Ok(Json(restaurant.admin_view()))
}

async fn current_view(state: &AppState, slug: &Slug) -> Result<Json<RestaurantView>, ApiError> {
    Ok(Json(state.restaurants.fetch(slug).await?.admin_view()))
}

// =============================================================================
// Order management
// =============================================================================

pub async fn list_orders(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let slug = session.authorize(&slug)?;
    let query = query.into_query(slug)?;
    Ok(Json(state.orders.orders_for(query).await?))
}

#[instrument(skip_all)]
pub async fn transition_order(
    State(state): State<AppState>,
    session: AdminSession,
    Path((slug, id)): Path<(String, String)>,
    body: JsonBody<TransitionRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    session.authorize(&slug)?;
    let (slug, id) = parse_order_path(&slug, &id)?;
    let Json(request) = body?;

    find_order(&state, &slug, id).await?;
    let (order, changed) = state
        .orders
        .transition(id, request.status, request.expected_version, request.reason)
        .await?;
    Ok(Json(TransitionResponse { order, changed }))
}

pub async fn update_order(
    State(state): State<AppState>,
    session: AdminSession,
    Path((slug, id)): Path<(String, String)>,
    body: JsonBody<OrderUpdate>,
) -> Result<Json<Order>, ApiError> {
    session.authorize(&slug)?;
    let (slug, id) = parse_order_path(&slug, &id)?;
    let Json(update) = body?;

    find_order(&state, &slug, id).await?;
    Ok(Json(state.orders.update_order(id, update).await?))
}
