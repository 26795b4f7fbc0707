//! Error responses. Every failure leaves the API as `{"error": kind, "message": text}`
//! with a matching status.

use crate::order_actor::OrderError;
use crate::restaurant_actor::RestaurantError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is well-formed but clashes with the current state.
    #[error("Conflict ({kind}): {message}")]
    Conflict { kind: &'static str, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    /// An actor is gone, usually because the server is shutting down.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn conflict(kind: &'static str, message: impl ToString) -> Self {
        ApiError::Conflict {
            kind,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                ("validation", msg)
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                ("unauthorized", msg)
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                ("forbidden", msg)
            }
            ApiError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                ("not_found", msg)
            }
            ApiError::Conflict { kind, message } => {
                tracing::info!(kind, "Conflict: {}", message);
                (kind, message)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("internal", msg)
            }
            ApiError::Unavailable(msg) => {
                tracing::error!("Unavailable: {}", msg);
                ("unavailable", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<RestaurantError> for ApiError {
    fn from(e: RestaurantError) -> Self {
        match e {
            RestaurantError::NotFound(_) => ApiError::NotFound(e.to_string()),
            RestaurantError::AlreadyExists(_) => ApiError::conflict("already_exists", e),
            RestaurantError::OrderingClosed(_) => ApiError::conflict("ordering_closed", e),
            RestaurantError::Unauthorized => ApiError::Unauthorized(e.to_string()),
            RestaurantError::PasswordHash(_) | RestaurantError::StorageError(_) => {
                ApiError::Internal(e.to_string())
            }
            RestaurantError::ActorCommunicationError(_) => ApiError::Unavailable(e.to_string()),
            RestaurantError::ValidationError(_)
            | RestaurantError::InvalidMenu(_)
            | RestaurantError::EmptyCart
            | RestaurantError::TooManyLines { .. }
            | RestaurantError::InvalidQuantity { .. }
            | RestaurantError::UnknownItem(_)
            | RestaurantError::ItemUnavailable(_) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) | OrderError::RestaurantNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            OrderError::ValidationError(_) | OrderError::InvalidCart(_) => {
                ApiError::BadRequest(e.to_string())
            }
            OrderError::OrderingClosed(_) => ApiError::conflict("ordering_closed", e),
            OrderError::PriceMismatch { .. } => ApiError::conflict("price_mismatch", e),
            OrderError::VersionConflict { .. } => ApiError::conflict("version_conflict", e),
            OrderError::InvalidTransition { .. } => ApiError::conflict("invalid_transition", e),
            OrderError::NotEditable(_) => ApiError::conflict("not_editable", e),
            OrderError::AlreadyExists(_) => ApiError::conflict("already_exists", e),
            OrderError::StorageError(_) => ApiError::Internal(e.to_string()),
            OrderError::ActorCommunicationError(_) => ApiError::Unavailable(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
