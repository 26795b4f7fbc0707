use super::{ApiError, AppState};
use crate::restaurant_actor::RestaurantQuery;
use axum::{extract::State, Json};
use resource_actor::ActorClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub restaurants: usize,
}

/// Liveness plus a round trip through the restaurant actor.
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>, ApiError> {
    let restaurants = state.restaurants.list(RestaurantQuery::All).await?;
    Ok(Json(Health {
        status: "ok".into(),
        restaurants: restaurants.len(),
    }))
}
