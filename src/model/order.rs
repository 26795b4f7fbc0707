//! Orders and their lifecycle.
//!
//! ```text
//! placed ──► accepted ──► completed
//!    │
//!    └─────► rejected
//! ```
//!
//! `rejected` and `completed` are terminal. Every change bumps [`Order::version`] and is
//! recorded in [`Order::history`].

use super::i18n::LocalizedText;
use super::restaurant::Slug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Upper bound on distinct lines in one cart.
pub const MAX_CART_LINES: usize = 50;

/// Upper bound on the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 99;

const MAX_TABLE_LEN: usize = 32;
const MAX_NOTE_LEN: usize = 500;
const MAX_CLIENT_REF_LEN: usize = 64;

// Namespace for ids derived from (restaurant, client_ref).
const CLIENT_REF_NAMESPACE: Uuid = Uuid::from_u128(0x6d65_6e75_2d70_6c61_7466_6f72_6d2d_6f72);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Accepted,
    Rejected,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }

    /// Legal moves. Staying in place is not a move; callers treat it as a no-op.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Placed, OrderStatus::Accepted)
                | (OrderStatus::Placed, OrderStatus::Rejected)
                | (OrderStatus::Accepted, OrderStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placed" => Ok(OrderStatus::Placed),
            "accepted" => Ok(OrderStatus::Accepted),
            "rejected" => Ok(OrderStatus::Rejected),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable id for a client-side order: the same `(restaurant, client_ref)` always maps to
    /// the same id, so a resubmission can never create a second order.
    pub fn for_client_ref(restaurant: &Slug, client_ref: &str) -> Self {
        let name = format!("{restaurant}/{client_ref}");
        Self(Uuid::new_v5(&CLIENT_REF_NAMESPACE, name.as_bytes()))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(OrderId)
            .map_err(|_| format!("invalid order id {s:?}"))
    }
}

/// One cart entry as submitted by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    pub quantity: u32,
}

/// A priced line. The label is a snapshot, so later menu edits do not rewrite old orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: String,
    pub label: LocalizedText,
    pub quantity: u32,
    pub unit_price_cents: u64,
    pub line_total_cents: u64,
}

/// Server-side pricing of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartQuote {
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub restaurant: Slug,
    pub lines: Vec<OrderLine>,
    pub total_cents: u64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    pub status: OrderStatus,
    pub version: u64,
    pub history: Vec<StatusChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_total_cents: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A freshly placed order. Lines carry the cart but no prices until [`Order::apply_quote`].
    pub fn new(id: OrderId, restaurant: Slug, request: PlaceOrderRequest) -> Self {
        let now = Utc::now();
        let lines = request
            .lines
            .into_iter()
            .map(|line| OrderLine {
                item_id: line.item_id,
                label: LocalizedText::new(),
                quantity: line.quantity,
                unit_price_cents: 0,
                line_total_cents: 0,
            })
            .collect();
        Self {
            id,
            restaurant,
            lines,
            total_cents: 0,
            currency: String::new(),
            table: request.table,
            customer_note: request.customer_note,
            status: OrderStatus::Placed,
            version: 1,
            history: vec![StatusChange {
                from: None,
                to: OrderStatus::Placed,
                at: now,
                reason: None,
            }],
            client_ref: request.client_ref,
            submitted_total_cents: request.expected_total_cents,
            created_at: now,
            updated_at: now,
        }
    }

    /// The cart this order was placed with.
    pub fn cart(&self) -> Vec<CartLine> {
        self.lines
            .iter()
            .map(|line| CartLine {
                item_id: line.item_id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// Adopts server pricing.
    pub fn apply_quote(&mut self, quote: CartQuote) {
        self.lines = quote.lines;
        self.total_cents = quote.total_cents;
        self.currency = quote.currency;
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// When the order reached its terminal status.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.is_finished().then_some(self.updated_at)
    }

    /// Records a change and bumps the version.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Body of `POST /api/restaurants/{slug}/orders`, also queued by the tracker while offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub lines: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    /// Total the customer saw. Checked against server pricing when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_total_cents: Option<u64>,
    /// Idempotency key chosen by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

impl PlaceOrderRequest {
    /// Checks the free-text fields. Cart contents are checked against the menu when priced.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(table) = &self.table {
            if table.trim().is_empty() || table.chars().count() > MAX_TABLE_LEN {
                return Err(format!("table must be 1-{MAX_TABLE_LEN} characters"));
            }
        }
        if let Some(note) = &self.customer_note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(format!("customer_note must be at most {MAX_NOTE_LEN} characters"));
            }
        }
        if let Some(client_ref) = &self.client_ref {
            validate_client_ref(client_ref)?;
        }
        Ok(())
    }
}

pub fn validate_client_ref(client_ref: &str) -> Result<(), String> {
    let ok_chars = client_ref
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if client_ref.is_empty() || client_ref.len() > MAX_CLIENT_REF_LEN || !ok_chars {
        return Err(format!(
            "client_ref must be 1-{MAX_CLIENT_REF_LEN} characters of [A-Za-z0-9_-]"
        ));
    }
    Ok(())
}

/// DTO for order creation.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub restaurant: Slug,
    pub request: PlaceOrderRequest,
}

/// DTO for order updates. Only allowed while the order is still `placed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
}

/// Filter for listing orders. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub restaurant: Option<Slug>,
    pub statuses: Vec<OrderStatus>,
    pub updated_since: Option<DateTime<Utc>>,
    pub finished_before: Option<DateTime<Utc>>,
}

impl OrderQuery {
    pub fn for_restaurant(slug: Slug) -> Self {
        Self {
            restaurant: Some(slug),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.restaurant
            .as_ref()
            .is_none_or(|slug| &order.restaurant == slug)
            && (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && self.updated_since.is_none_or(|since| order.updated_at >= since)
            && self
                .finished_before
                .is_none_or(|cutoff| order.finished_at().is_some_and(|at| at < cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order(status: OrderStatus) -> Order {
        let mut order = Order::new(
            OrderId::random(),
            Slug::parse("chez-test").unwrap(),
            PlaceOrderRequest::default(),
        );
        order.status = status;
        order
    }

    #[test]
    fn transitions() {
        use OrderStatus::*;
        assert!(Placed.can_transition_to(Accepted));
        assert!(Placed.can_transition_to(Rejected));
        assert!(Accepted.can_transition_to(Completed));
        assert!(!Placed.can_transition_to(Completed));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Completed.can_transition_to(Placed));
        assert!(!Placed.can_transition_to(Placed));
        assert!(Rejected.is_terminal() && Completed.is_terminal());
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        assert_eq!("Completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert!("cooking".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn client_ref_ids_are_stable_per_restaurant() {
        let a = Slug::parse("place-a").unwrap();
        let b = Slug::parse("place-b").unwrap();
        assert_eq!(
            OrderId::for_client_ref(&a, "ref-1"),
            OrderId::for_client_ref(&a, "ref-1")
        );
        assert_ne!(
            OrderId::for_client_ref(&a, "ref-1"),
            OrderId::for_client_ref(&b, "ref-1")
        );
    }

    #[test]
    fn request_validation() {
        let mut req = PlaceOrderRequest {
            client_ref: Some("local-1".into()),
            table: Some("12".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        req.client_ref = Some("has space".into());
        assert!(req.validate().is_err());
        req.client_ref = None;
        req.customer_note = Some("x".repeat(MAX_NOTE_LEN + 1));
        assert!(req.validate().is_err());
    }

    #[test]
    fn query_filters() {
        let placed = order(OrderStatus::Placed);
        let mut done = order(OrderStatus::Completed);
        done.updated_at = Utc::now() - Duration::hours(48);

        let open = OrderQuery {
            statuses: vec![OrderStatus::Placed, OrderStatus::Accepted],
            ..Default::default()
        };
        assert!(open.matches(&placed));
        assert!(!open.matches(&done));

        let stale = OrderQuery {
            finished_before: Some(Utc::now() - Duration::hours(24)),
            ..Default::default()
        };
        assert!(stale.matches(&done));
        assert!(!stale.matches(&placed));

        let other = OrderQuery::for_restaurant(Slug::parse("elsewhere").unwrap());
        assert!(!other.matches(&placed));
    }
}
