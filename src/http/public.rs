//! Customer endpoints: no authentication.

use super::{parse_slug, ApiError, AppState};
use crate::model::{LocalizedMenu, Order, OrderId, PlaceOrderRequest, PublicRestaurant, Slug};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub lang: Option<String>,
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicRestaurant>, ApiError> {
    let slug = parse_slug(&slug)?;
    let restaurant = state.restaurants.fetch(&slug).await?;
    Ok(Json(restaurant.public_view(Utc::now())))
}

/// The menu in one language. Unknown or missing `lang` falls back to the restaurant default.
pub async fn get_menu(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<LocalizedMenu>, ApiError> {
    let slug = parse_slug(&slug)?;
    let restaurant = state.restaurants.fetch(&slug).await?;
    let lang = restaurant.info.pick_language(query.lang.as_deref());
    Ok(Json(
        restaurant
            .menu
            .localize(&lang, &restaurant.info.default_language),
    ))
}

#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let slug = parse_slug(&slug)?;
    let Json(request) = body?;
    let order = state.orders.place_order(slug, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
    let (slug, id) = parse_order_path(&slug, &id)?;
    Ok(Json(find_order(&state, &slug, id).await?))
}

pub(crate) fn parse_order_path(slug: &str, id: &str) -> Result<(Slug, OrderId), ApiError> {
    let slug = parse_slug(slug)?;
    let id = id
        .parse::<OrderId>()
        .map_err(|_| ApiError::NotFound(format!("Order not found: {id}")))?;
    Ok((slug, id))
}

/// Fetches an order of `slug`. Orders of other restaurants are reported as missing.
pub(crate) async fn find_order(
    state: &AppState,
    slug: &Slug,
    id: OrderId,
) -> Result<Order, ApiError> {
    let order = state.orders.fetch(id).await?;
    if &order.restaurant != slug {
        return Err(ApiError::NotFound(format!("Order not found: {id}")));
    }
    Ok(order)
}
