//! Error types for the Restaurant actor.

use crate::auth::PasswordError;
use crate::model::MenuError;
use thiserror::Error;

/// Errors that can occur during restaurant operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RestaurantError {
    /// No restaurant with this slug.
    #[error("Restaurant not found: {0}")]
    NotFound(String),

    /// The slug is taken.
    #[error("Restaurant already exists: {0}")]
    AlreadyExists(String),

    /// A field of the restaurant record is invalid.
    #[error("Restaurant validation error: {0}")]
    ValidationError(String),

    #[error("Invalid menu: {0}")]
    InvalidMenu(#[from] MenuError),

    /// The owner has switched ordering off.
    #[error("Ordering is closed for {0}")]
    OrderingClosed(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart has {count} lines, at most {max} allowed")]
    TooManyLines { count: usize, max: usize },

    #[error("Invalid quantity {quantity} for item {item}")]
    InvalidQuantity { item: String, quantity: u32 },

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item unavailable: {0}")]
    ItemUnavailable(String),

    /// Wrong admin password.
    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// The store refused a write.
    #[error("Restaurant storage error: {0}")]
    StorageError(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl RestaurantError {
    /// Errors caused by the cart contents rather than by the restaurant.
    pub fn is_cart_error(&self) -> bool {
        matches!(
            self,
            RestaurantError::EmptyCart
                | RestaurantError::TooManyLines { .. }
                | RestaurantError::InvalidQuantity { .. }
                | RestaurantError::UnknownItem(_)
                | RestaurantError::ItemUnavailable(_)
        )
    }
}

impl From<String> for RestaurantError {
    fn from(msg: String) -> Self {
        RestaurantError::ActorCommunicationError(msg)
    }
}

impl From<PasswordError> for RestaurantError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => RestaurantError::ValidationError(e.to_string()),
            PasswordError::HashError(msg) => RestaurantError::PasswordHash(msg),
        }
    }
}
