//! # Order Client
//!
//! High-level API over the `Order` actor. Pricing and lifecycle rules live in the actor's
//! hooks; this client adds idempotent placement and the queries the HTTP layer needs.
use crate::model::{
    Order, OrderCreate, OrderId, OrderQuery, OrderStatus, OrderUpdate, PlaceOrderRequest, Slug,
};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resource_actor::{ActorClient, FrameworkError, ResourceClient, ResourceEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<OrderError>() {
            Ok(typed) => typed,
            Err(FrameworkError::NotFound(id)) => OrderError::NotFound(id),
            Err(FrameworkError::AlreadyExists(id)) => OrderError::AlreadyExists(id),
            Err(FrameworkError::Storage(e)) => OrderError::StorageError(e.to_string()),
            Err(other) => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl OrderClient {
    /// Places an order.
    ///
    /// With a `client_ref` the call is idempotent: placing the same ref again returns the
    /// order created the first time, whatever its status by now.
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn place_order(
        &self,
        restaurant: Slug,
        request: PlaceOrderRequest,
    ) -> Result<Order, OrderError> {
        let replay_id = request
            .client_ref
            .as_deref()
            .map(|client_ref| OrderId::for_client_ref(&restaurant, client_ref));

        debug!("Sending request");
        let created = self
            .inner
            .create(OrderCreate {
                restaurant: restaurant.clone(),
                request,
            })
            .await
            .map_err(Self::map_error);

        let id = match (created, replay_id) {
            (Ok(id), _) => {
                info!(order_id = %id, %restaurant, "Order placed");
                id
            }
            (Err(OrderError::AlreadyExists(_)), Some(id)) => {
                debug!(order_id = %id, "Replayed client ref, returning existing order");
                id
            }
            (Err(e), _) => return Err(e),
        };
        self.fetch(id).await
    }

    /// Fetches an order, turning a missing one into `NotFound`.
    pub async fn fetch(&self, id: OrderId) -> Result<Order, OrderError> {
        self.get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Orders matching `query`, oldest first.
    #[instrument(skip(self))]
    pub async fn orders_for(&self, query: OrderQuery) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.list(query).await?;
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    /// Moves an order to `to`. Returns the order after the call and whether it changed.
    #[instrument(skip(self, reason))]
    pub async fn transition(
        &self,
        id: OrderId,
        to: OrderStatus,
        expected_version: Option<u64>,
        reason: Option<String>,
    ) -> Result<(Order, bool), OrderError> {
        debug!("Sending request");
        let action = OrderAction::Transition {
            to,
            expected_version,
            reason,
        };
        match self
            .inner
            .perform_action(id, action)
            .await
            .map_err(Self::map_error)?
        {
            OrderActionResult::Transition { order, changed } => {
                if changed {
                    info!(order_id = %id, status = %order.status, version = order.version, "Order status changed");
                }
                Ok((order, changed))
            }
        }
    }

    #[instrument(skip(self, update))]
    pub async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<Order, OrderError> {
        debug!("Sending request");
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    /// Deletes every finished order whose final status is older than `cutoff`.
    #[instrument(skip(self))]
    pub async fn purge_finished(&self, cutoff: DateTime<Utc>) -> Result<usize, OrderError> {
        let stale = self
            .list(OrderQuery {
                finished_before: Some(cutoff),
                ..Default::default()
            })
            .await?;

        let mut purged = 0;
        for order in stale {
            match self.delete(order.id).await {
                Ok(()) => purged += 1,
                // Gone already, e.g. purged by a concurrent run.
                Err(OrderError::NotFound(_)) => {}
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Failed to purge order");
                    return Err(e);
                }
            }
        }
        Ok(purged)
    }

    /// Committed order changes, from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<Order>> {
        self.inner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartLine;
    use chrono::Duration;
    use resource_actor::mock::{create_mock_client, expect_create, expect_get, MockClient};

    fn slug() -> Slug {
        Slug::parse("chez-test").unwrap()
    }

    fn request(client_ref: Option<&str>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            lines: vec![CartLine {
                item_id: "soup".into(),
                quantity: 1,
            }],
            client_ref: client_ref.map(str::to_string),
            ..Default::default()
        }
    }

    fn order(id: OrderId, created_at: DateTime<Utc>) -> Order {
        let mut order = Order::new(id, slug(), request(None));
        order.created_at = created_at;
        order
    }

    #[tokio::test]
    async fn replayed_client_ref_returns_the_existing_order() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let orders = OrderClient::new(client);
        let expected_id = OrderId::for_client_ref(&slug(), "local-1");

        let task =
            tokio::spawn(async move { orders.place_order(slug(), request(Some("local-1"))).await });

        let (params, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(params.request.client_ref.as_deref(), Some("local-1"));
        responder
            .send(Err(FrameworkError::AlreadyExists(expected_id.to_string())))
            .unwrap();

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, expected_id);
        responder.send(Ok(Some(order(id, Utc::now())))).unwrap();

        assert_eq!(task.await.unwrap().unwrap().id, expected_id);
    }

    #[tokio::test]
    async fn duplicates_without_client_ref_are_errors() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_create()
            .return_err(FrameworkError::AlreadyExists("x".into()));
        let orders = OrderClient::new(mock.client());

        assert_eq!(
            orders.place_order(slug(), request(None)).await,
            Err(OrderError::AlreadyExists("x".into()))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn pricing_failures_come_back_typed() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_create()
            .return_err(FrameworkError::EntityError(Box::new(
                OrderError::PriceMismatch {
                    expected: 100,
                    actual: 650,
                },
            )));
        let orders = OrderClient::new(mock.client());

        assert_eq!(
            orders.place_order(slug(), request(None)).await,
            Err(OrderError::PriceMismatch {
                expected: 100,
                actual: 650
            })
        );
    }

    #[tokio::test]
    async fn orders_for_sorts_oldest_first() {
        let now = Utc::now();
        let newer = order(OrderId::random(), now);
        let older = order(OrderId::random(), now - Duration::minutes(5));

        let mut mock = MockClient::<Order>::new();
        mock.expect_list()
            .return_ok(vec![newer.clone(), older.clone()]);
        let orders = OrderClient::new(mock.client());

        let listed = orders
            .orders_for(OrderQuery::for_restaurant(slug()))
            .await
            .unwrap();
        assert_eq!(listed, vec![older, newer]);
    }

    #[tokio::test]
    async fn purge_deletes_what_the_query_returns() {
        let a = order(OrderId::random(), Utc::now());
        let b = order(OrderId::random(), Utc::now());

        let mut mock = MockClient::<Order>::new();
        mock.expect_list().return_ok(vec![a.clone(), b.clone()]);
        mock.expect_delete(a.id).return_ok(());
        mock.expect_delete(b.id)
            .return_err(FrameworkError::NotFound(b.id.to_string()));
        let orders = OrderClient::new(mock.client());

        assert_eq!(orders.purge_finished(Utc::now()).await.unwrap(), 1);
        mock.verify();
    }
}
