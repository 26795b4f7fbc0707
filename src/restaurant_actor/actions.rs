//! Custom actions for the Restaurant actor.
//!
//! Everything beyond plain field updates: menu edits, promotions, credentials and cart
//! pricing. Handled by [`ActorEntity::handle_action`](resource_actor::ActorEntity::handle_action)
//! on [`Restaurant`](crate::model::Restaurant).

use crate::model::{CartLine, CartQuote, Menu, Promotion};

/// Custom actions for Restaurant entities.
#[derive(Debug, Clone)]
pub enum RestaurantAction {
    /// Swaps in a whole new menu after validating it.
    ReplaceMenu(Menu),
    /// Marks one item as (un)available without touching the rest of the menu.
    SetItemAvailability { item_id: String, available: bool },
    /// Sets or clears the promotion.
    SetPromotion(Option<Promotion>),
    /// Stores a new Argon2 hash. Hashing happens in the client, off the actor loop.
    SetPasswordHash(String),
    /// Prices a cart against the current menu. Read-only.
    QuoteCart(Vec<CartLine>),
}

impl RestaurantAction {
    pub fn is_read_only(&self) -> bool {
        matches!(self, RestaurantAction::QuoteCart(_))
    }
}

/// Results from RestaurantActions - variants match 1:1 with RestaurantAction
#[derive(Debug, Clone)]
pub enum RestaurantActionResult {
    ReplaceMenu(()),
    SetItemAvailability(()),
    SetPromotion(()),
    SetPasswordHash(()),
    QuoteCart(CartQuote),
}
