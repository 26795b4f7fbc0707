//! Remote side of the tracker: the platform's REST API.

use crate::http::ErrorResponse;
use crate::model::{Order, OrderId, PlaceOrderRequest, Slug};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// No answer: connection refused, DNS failure, timeout.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a 5xx.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The server refused the request for good (4xx).
    #[error("Rejected ({status} {kind}): {message}")]
    Rejected {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("Order not found")]
    NotFound,

    /// The server accepted the request but its answer was lost or garbled.
    #[error("Answer lost after success: {0}")]
    Unconfirmed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Worth retrying later: the request may succeed once the backend is reachable again.
    ///
    /// A lost answer to an accepted placement is retried too; the replay returns the stored
    /// order.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Unreachable(_)
                | BackendError::Server { .. }
                | BackendError::Unconfirmed(_)
        )
    }
}

/// What the tracker needs from the platform.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn place_order(
        &self,
        restaurant: &Slug,
        request: &PlaceOrderRequest,
    ) -> Result<Order, BackendError>;

    async fn fetch_order(&self, restaurant: &Slug, id: OrderId) -> Result<Order, BackendError>;
}

/// [`OrderBackend`] over the public REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpOrderBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::InvalidResponse(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn orders_url(&self, restaurant: &Slug) -> String {
        format!("{}/api/restaurants/{restaurant}/orders", self.base_url)
    }

    async fn read_order(response: Response) -> Result<Order, BackendError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<Order>()
                .await
                .map_err(|e| BackendError::Unconfirmed(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let (kind, message) = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => (err.error, err.message),
            Err(_) => (String::from("unknown"), body),
        };
        debug!(%status, %kind, "Backend refused request");
        Err(match status {
            StatusCode::NOT_FOUND => BackendError::NotFound,
            s if s.is_server_error() => BackendError::Server {
                status: s.as_u16(),
                message,
            },
            s => BackendError::Rejected {
                status: s.as_u16(),
                kind,
                message,
            },
        })
    }
}

fn unreachable(e: reqwest::Error) -> BackendError {
    BackendError::Unreachable(e.to_string())
}

#[async_trait]
impl OrderBackend for HttpOrderBackend {
    async fn place_order(
        &self,
        restaurant: &Slug,
        request: &PlaceOrderRequest,
    ) -> Result<Order, BackendError> {
        let response = self
            .client
            .post(self.orders_url(restaurant))
            .json(request)
            .send()
            .await
            .map_err(unreachable)?;
        match Self::read_order(response).await {
            // On placement a 404 means the restaurant is gone: a permanent refusal.
            Err(BackendError::NotFound) => Err(BackendError::Rejected {
                status: 404,
                kind: "not_found".into(),
                message: format!("restaurant {restaurant} not found"),
            }),
            other => other,
        }
    }

    async fn fetch_order(&self, restaurant: &Slug, id: OrderId) -> Result<Order, BackendError> {
        let response = self
            .client
            .get(format!("{}/{id}", self.orders_url(restaurant)))
            .send()
            .await
            .map_err(unreachable)?;
        Self::read_order(response).await
    }
}
