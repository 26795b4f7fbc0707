//! ActorEntity implementation for the Order domain type.
//!
//! Pricing is never trusted from the client: `on_create` asks the restaurant actor (through
//! the injected [`RestaurantClient`]) for a quote and adopts it.

use super::actions::{OrderAction, OrderActionResult};
use super::error::OrderError;
use crate::clients::RestaurantClient;
use crate::model::{
    Order, OrderCreate, OrderId, OrderQuery, OrderStatus, OrderUpdate, PlaceOrderRequest,
    StatusChange,
};
use async_trait::async_trait;
use chrono::Utc;
use resource_actor::ActorEntity;
use tracing::debug;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Query = OrderQuery;
    type Context = RestaurantClient;
    type Error = OrderError;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn assign_id(_seq: u64, params: &OrderCreate) -> OrderId {
        match &params.request.client_ref {
            Some(client_ref) => OrderId::for_client_ref(&params.restaurant, client_ref),
            None => OrderId::random(),
        }
    }

    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, Self::Error> {
        params
            .request
            .validate()
            .map_err(OrderError::ValidationError)?;
        Ok(Order::new(id, params.restaurant, params.request))
    }

    fn matches(&self, query: &OrderQuery) -> bool {
        query.matches(self)
    }

    /// Prices the cart through the restaurant actor.
    async fn on_create(&mut self, restaurants: &RestaurantClient) -> Result<(), Self::Error> {
        let quote = restaurants
            .quote_cart(self.restaurant.clone(), self.cart())
            .await?;
        debug!(order_id = %self.id, total = quote.total_cents, "Cart priced");

        if let Some(expected) = self.submitted_total_cents {
            if expected != quote.total_cents {
                return Err(OrderError::PriceMismatch {
                    expected,
                    actual: quote.total_cents,
                });
            }
        }
        self.apply_quote(quote);
        Ok(())
    }

    async fn on_update(
        &mut self,
        update: OrderUpdate,
        _ctx: &RestaurantClient,
    ) -> Result<(), Self::Error> {
        if self.status != OrderStatus::Placed {
            return Err(OrderError::NotEditable(self.status));
        }
        if update.table.is_none() && update.customer_note.is_none() {
            return Ok(());
        }
        let table = update.table.or_else(|| self.table.clone());
        let customer_note = update.customer_note.or_else(|| self.customer_note.clone());
        PlaceOrderRequest {
            table: table.clone(),
            customer_note: customer_note.clone(),
            ..Default::default()
        }
        .validate()
        .map_err(OrderError::ValidationError)?;

        self.table = table;
        self.customer_note = customer_note;
        self.touch();
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        _ctx: &RestaurantClient,
    ) -> Result<OrderActionResult, Self::Error> {
        match action {
            OrderAction::Transition {
                to,
                expected_version,
                reason,
            } => {
                if self.status == to {
                    return Ok(OrderActionResult::Transition {
                        order: self.clone(),
                        changed: false,
                    });
                }
                if let Some(expected) = expected_version {
                    if expected != self.version {
                        return Err(OrderError::VersionConflict {
                            expected,
                            actual: self.version,
                        });
                    }
                }
                if !self.status.can_transition_to(to) {
                    return Err(OrderError::InvalidTransition {
                        from: self.status,
                        to,
                    });
                }

                self.history.push(StatusChange {
                    from: Some(self.status),
                    to,
                    at: Utc::now(),
                    reason,
                });
                self.status = to;
                self.touch();
                Ok(OrderActionResult::Transition {
                    order: self.clone(),
                    changed: true,
                })
            }
        }
    }
}
