// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Customer, LineItem};

/// Closed set of order states. Provider vocabularies from every webhook
/// family funnel into this enum through the mapping functions below;
/// anything unrecognized becomes `Unknown` instead of being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Created,
  Paid,
  Failed,
  Cancelled,
  Refunded,
  Unknown,
}

impl OrderStatus {
  /// Commerce-platform (Scalev) status vocabulary. The paid synonyms are the
  /// set the platform actually emits across payment channels.
  pub fn from_commerce(raw: &str) -> Self {
    match raw.to_ascii_lowercase().as_str() {
      "paid" | "settled" | "success" => OrderStatus::Paid,
      "created" => OrderStatus::Created,
      "pending" => OrderStatus::Pending,
      "cancelled" | "canceled" => OrderStatus::Cancelled,
      "refunded" => OrderStatus::Refunded,
      _ => OrderStatus::Unknown,
    }
  }

  /// Payment-gateway (Midtrans) `transaction_status` vocabulary.
  pub fn from_gateway(transaction_status: &str) -> Self {
    match transaction_status {
      "settlement" | "capture" => OrderStatus::Paid,
      "cancel" | "deny" | "expire" => OrderStatus::Failed,
      "pending" => OrderStatus::Pending,
      "refund" | "partial_refund" => OrderStatus::Refunded,
      _ => OrderStatus::Unknown,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderStatus::Failed | OrderStatus::Cancelled | OrderStatus::Refunded
    )
  }

  /// Forward-only lattice. Re-applying the current status is allowed so
  /// redeliveries stay idempotent; `Paid` admits only `Refunded`.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    if self == next {
      return true;
    }
    match self {
      Pending | Unknown => true,
      Created => !matches!(next, Pending),
      Paid => matches!(next, Refunded),
      Failed | Cancelled | Refunded => false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub order_id: String,
  pub status: OrderStatus,
  pub gross_amount: u64,
  pub items: Vec<LineItem>,
  /// Absent on records first seen through a webhook for an id we never
  /// created locally.
  pub customer: Option<Customer>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// Provider event timestamp backing the current status. Consulted to
  /// reject stale redeliveries.
  pub event_time: Option<DateTime<Utc>>,
}
