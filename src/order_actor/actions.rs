//! Custom actions for the Order actor.

use crate::model::{Order, OrderStatus};

/// Custom actions for Order entities.
#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves the order along its lifecycle.
    ///
    /// With `expected_version`, the move only happens if nobody changed the order since the
    /// caller last read it. Asking for the status the order already has succeeds without a
    /// change, whatever the version.
    Transition {
        to: OrderStatus,
        expected_version: Option<u64>,
        reason: Option<String>,
    },
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    Transition { order: Order, changed: bool },
}
