//! Error types for the Order actor.

use crate::model::OrderStatus;
use crate::restaurant_actor::RestaurantError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// The order names a restaurant that does not exist.
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    #[error("Ordering is closed for {0}")]
    OrderingClosed(String),

    /// The cart does not fit the current menu (unknown or unavailable item, bad quantity).
    #[error("Invalid cart: {0}")]
    InvalidCart(String),

    /// The customer priced the cart against a stale menu.
    #[error("Price mismatch: client expected {expected} cents, menu says {actual}")]
    PriceMismatch { expected: u64, actual: u64 },

    /// Optimistic concurrency check failed.
    #[error("Version conflict: expected {expected}, current is {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Details can only change while the order is still placed.
    #[error("Order can no longer be edited (status {0})")]
    NotEditable(OrderStatus),

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(String),

    /// The store refused a write.
    #[error("Order storage error: {0}")]
    StorageError(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for OrderError {
    fn from(msg: String) -> Self {
        OrderError::ActorCommunicationError(msg)
    }
}

impl From<RestaurantError> for OrderError {
    fn from(e: RestaurantError) -> Self {
        match e {
            RestaurantError::NotFound(slug) => OrderError::RestaurantNotFound(slug),
            RestaurantError::OrderingClosed(slug) => OrderError::OrderingClosed(slug),
            e if e.is_cart_error() => OrderError::InvalidCart(e.to_string()),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
