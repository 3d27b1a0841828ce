// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::models::{Order, OrderStatus};
use crate::store::{is_stale, OrderPatch, OrderStore};

/// Process-local store keyed by order id. The write lock makes each upsert
/// one atomic read-modify-write, so racing webhook deliveries cannot lose
/// updates to the same key.
#[derive(Default)]
pub struct InMemoryOrderStore {
  orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn get(&self, order_id: &str) -> Result<Option<Order>> {
    Ok(self.orders.read().get(order_id).cloned())
  }

  async fn upsert(&self, order_id: &str, status: OrderStatus, patch: OrderPatch) -> Result<Order> {
    use std::collections::hash_map::Entry;

    let now = Utc::now();
    let mut orders = self.orders.write();

    let order = match orders.entry(order_id.to_string()) {
      Entry::Occupied(mut entry) => {
        let existing = entry.get_mut();
        if is_stale(existing.event_time, patch.event_time) {
          debug!(
            order_id,
            stored_event_time = ?existing.event_time,
            incoming_event_time = ?patch.event_time,
            "Ignoring stale order event"
          );
          return Ok(existing.clone());
        }
        if !existing.status.can_transition_to(status) {
          warn!(
            order_id,
            from = ?existing.status,
            to = ?status,
            "Ignoring backward status transition"
          );
          return Ok(existing.clone());
        }
        if existing.status != status {
          debug!(order_id, from = ?existing.status, to = ?status, "Order status transition");
        }
        existing.status = status;
        if let Some(gross_amount) = patch.gross_amount {
          existing.gross_amount = gross_amount;
        }
        if let Some(items) = patch.items {
          existing.items = items;
        }
        if let Some(customer) = patch.customer {
          existing.customer = Some(customer);
        }
        if patch.event_time.is_some() {
          existing.event_time = patch.event_time;
        }
        existing.updated_at = now;
        existing.clone()
      }
      Entry::Vacant(entry) => {
        let order = Order {
          order_id: order_id.to_string(),
          status,
          gross_amount: patch.gross_amount.unwrap_or(0),
          items: patch.items.unwrap_or_default(),
          customer: patch.customer,
          created_at: now,
          updated_at: now,
          event_time: patch.event_time,
        };
        entry.insert(order.clone());
        order
      }
    };

    Ok(order)
  }

  async fn list(&self) -> Result<Vec<Order>> {
    Ok(self.orders.read().values().cloned().collect())
  }
}
