//! Server-Sent Events built on the order actor's change feed.
//!
//! Every stream ends when the platform shuts down, so graceful shutdown never waits on an
//! idle subscriber.

use super::public::{find_order, parse_order_path};
use super::{AdminSession, ApiError, AppState};
use crate::clients::OrderClient;
use crate::model::{OrderId, OrderQuery, Slug};
use crate::order_actor::OrderError;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use resource_actor::ResourceEvent;
use serde::Serialize;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Follows one order: the current state first, then every newer version. Ends after a
/// terminal status.
///
/// Events: `order` (the full order), `removed` (the order was purged).
pub async fn order_events(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (slug, id) = parse_order_path(&slug, &id)?;
    // Subscribe before reading so no change slips between the read and the feed.
    let mut feed = state.orders.subscribe();
    let current = find_order(&state, &slug, id).await?;
    let shutdown = state.shutdown.clone();
    let orders = state.orders.clone();

    let stream = async_stream::stream! {
        let mut version = current.version;
        let finished = current.is_finished();
        yield Ok(sse_event("order", &current));
        if finished {
            return;
        }

        loop {
            let received = tokio::select! {
                _ = shutdown.triggered() => break,
                received = feed.recv() => received,
            };
            match received {
                Ok(ResourceEvent::Upserted(order)) if order.id == id => {
                    if order.version <= version {
                        continue;
                    }
                    version = order.version;
                    let finished = order.is_finished();
                    yield Ok(sse_event("order", &order));
                    if finished {
                        break;
                    }
                }
                Ok(ResourceEvent::Removed(removed)) if removed == id => {
                    yield Ok(sse_event("removed", &id));
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!(order_id = %id, missed, "Order stream lagged, re-reading");
                    match orders.fetch(id).await {
                        Ok(order) if order.version > version => {
                            version = order.version;
                            let finished = order.is_finished();
                            yield Ok(sse_event("order", &order));
                            if finished {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(order_id = %id, error = %e, "Order vanished while streaming");
                            break;
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Serialize)]
struct Resync {
    missed: u64,
}

/// Every committed order change of the session's restaurant.
///
/// Events: `order` (the full order), `removed` (the id of a purged order), `resync` (the
/// subscriber fell behind and should reload the order list).
pub async fn admin_order_events(
    State(state): State<AppState>,
    session: AdminSession,
    Path(slug): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let slug = session.authorize(&slug)?;
    let mut feed = state.orders.subscribe();
    let shutdown = state.shutdown.clone();
    let orders = state.orders.clone();
    // Removals only carry the id: remember which ids belong to this restaurant.
    let mut known = restaurant_order_ids(&orders, &slug).await?;
    info!(%slug, "Admin subscribed to orders");

    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.triggered() => break,
                received = feed.recv() => received,
            };
            match received {
                Ok(ResourceEvent::Upserted(order)) if order.restaurant == slug => {
                    known.insert(order.id);
                    yield Ok(sse_event("order", &order));
                }
                Ok(ResourceEvent::Removed(id)) if known.remove(&id) => {
                    yield Ok(sse_event("removed", &id));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(%slug, missed, "Admin order stream lagged");
                    match restaurant_order_ids(&orders, &slug).await {
                        Ok(ids) => known = ids,
                        Err(e) => warn!(%slug, error = %e, "Could not reload order ids"),
                    }
                    yield Ok(sse_event("resync", &Resync { missed }));
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(%slug, "Admin order stream closed");
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn restaurant_order_ids(
    orders: &OrderClient,
    slug: &Slug,
) -> Result<HashSet<OrderId>, OrderError> {
    let orders = orders
        .orders_for(OrderQuery::for_restaurant(slug.clone()))
        .await?;
    Ok(orders.into_iter().map(|o| o.id).collect())
}

fn sse_event<T: Serialize>(event_type: &str, data: &T) -> Event {
    Event::default()
        .event(event_type)
        .data(serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string()))
}

