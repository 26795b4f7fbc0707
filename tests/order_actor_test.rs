//! Real order actor, mocked restaurant actor.
//!
//! The order actor's `on_create` prices every cart through its injected `RestaurantClient`.
//! Mocking that client isolates the order lifecycle from menus and credentials.

mod common;

use common::cart;
use menu_platform::clients::{OrderClient, RestaurantClient};
use menu_platform::model::{
    CartQuote, LocalizedText, OrderLine, OrderStatus, Restaurant, Slug,
};
use menu_platform::order_actor::{self, OrderError};
use menu_platform::restaurant_actor::RestaurantActionResult;
use resource_actor::mock::MockClient;
use resource_actor::FrameworkError;

fn slug() -> Slug {
    Slug::parse("chez-test").unwrap()
}

fn soup_quote(quantity: u32) -> CartQuote {
    CartQuote {
        lines: vec![OrderLine {
            item_id: "soup".into(),
            label: LocalizedText::single("en", "Soup"),
            quantity,
            unit_price_cents: 650,
            line_total_cents: 650 * u64::from(quantity),
        }],
        total_cents: 650 * u64::from(quantity),
        currency: "EUR".into(),
    }
}

#[tokio::test]
async fn order_is_priced_by_the_restaurant() {
    let mut restaurant_mock = MockClient::<Restaurant>::new();
    restaurant_mock
        .expect_action(slug())
        .return_ok(RestaurantActionResult::QuoteCart(soup_quote(2)));

    let (order_actor, order_client) = order_actor::new(16);
    let handle = tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_mock.client())));
    let orders = OrderClient::new(order_client);

    let order = orders
        .place_order(slug(), cart(&[("soup", 2)]))
        .await
        .unwrap();
    assert_eq!(order.total_cents, 1300);
    assert_eq!(order.currency, "EUR");
    assert_eq!(order.lines[0].label.get("en"), Some("Soup"));
    assert_eq!(order.status, OrderStatus::Placed);
    assert_eq!(order.version, 1);

    let (accepted, changed) = orders
        .transition(order.id, OrderStatus::Accepted, Some(1), None)
        .await
        .unwrap();
    assert!(changed);
    assert_eq!(accepted.version, 2);
    assert_eq!(accepted.history.len(), 2);

    restaurant_mock.verify();
    drop(orders);
    handle.await.unwrap();
}

#[tokio::test]
async fn stale_client_total_is_refused() {
    let mut restaurant_mock = MockClient::<Restaurant>::new();
    restaurant_mock
        .expect_action(slug())
        .return_ok(RestaurantActionResult::QuoteCart(soup_quote(1)));

    let (order_actor, order_client) = order_actor::new(16);
    let handle = tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_mock.client())));
    let orders = OrderClient::new(order_client);

    let mut request = cart(&[("soup", 1)]);
    request.expected_total_cents = Some(600);
    let err = orders.place_order(slug(), request).await.unwrap_err();
    assert_eq!(
        err,
        OrderError::PriceMismatch {
            expected: 600,
            actual: 650
        }
    );
    assert!(orders
        .orders_for(Default::default())
        .await
        .unwrap()
        .is_empty());

    restaurant_mock.verify();
    drop(orders);
    handle.await.unwrap();
}

#[tokio::test]
async fn unknown_restaurant_surfaces_as_order_error() {
    let mut restaurant_mock = MockClient::<Restaurant>::new();
    restaurant_mock
        .expect_action(slug())
        .return_err(FrameworkError::NotFound(slug().to_string()));

    let (order_actor, order_client) = order_actor::new(16);
    let handle = tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_mock.client())));
    let orders = OrderClient::new(order_client);

    let err = orders
        .place_order(slug(), cart(&[("soup", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::RestaurantNotFound(_)), "{err:?}");

    restaurant_mock.verify();
    drop(orders);
    handle.await.unwrap();
}

#[tokio::test]
async fn client_ref_replays_return_the_first_order() {
    let mut restaurant_mock = MockClient::<Restaurant>::new();
    // Priced once: the replay is refused before on_create runs.
    restaurant_mock
        .expect_action(slug())
        .return_ok(RestaurantActionResult::QuoteCart(soup_quote(1)));

    let (order_actor, order_client) = order_actor::new(16);
    let handle = tokio::spawn(order_actor.run(RestaurantClient::new(restaurant_mock.client())));
    let orders = OrderClient::new(order_client);

    let mut request = cart(&[("soup", 1)]);
    request.client_ref = Some("kiosk-7-0042".into());
    let first = orders.place_order(slug(), request.clone()).await.unwrap();
    orders
        .transition(first.id, OrderStatus::Accepted, None, None)
        .await
        .unwrap();

    let replay = orders.place_order(slug(), request).await.unwrap();
    assert_eq!(replay.id, first.id);
    assert_eq!(replay.status, OrderStatus::Accepted);
    assert_eq!(orders.orders_for(Default::default()).await.unwrap().len(), 1);

    restaurant_mock.verify();
    drop(orders);
    handle.await.unwrap();
}
