// src/store/mod.rs

//! Order record store.
//!
//! All mutation goes through [`OrderStore::upsert`]. The trait is async so a
//! durable backend can replace [`InMemoryOrderStore`] without touching
//! callers; handlers receive it as `Arc<dyn OrderStore>` via `AppState`.

pub mod memory;

pub use memory::InMemoryOrderStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{Customer, LineItem, Order, OrderStatus};

/// Partial update merged into an existing record. Fields left `None`
/// preserve whatever the record already holds.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
  pub gross_amount: Option<u64>,
  pub items: Option<Vec<LineItem>>,
  pub customer: Option<Customer>,
  /// Provider event timestamp, when the delivery carries one. Used to
  /// reject stale redeliveries.
  pub event_time: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn get(&self, order_id: &str) -> Result<Option<Order>>;

  /// Sole mutator. Creates the record if absent, otherwise merges `patch`
  /// and applies `status` subject to the transition lattice and stale-event
  /// rejection. Returns the record as stored after the call.
  async fn upsert(&self, order_id: &str, status: OrderStatus, patch: OrderPatch) -> Result<Order>;

  async fn list(&self) -> Result<Vec<Order>>;
}

/// Decide whether an incoming event should be applied over the stored one.
/// Last-event-time-wins when both sides carry provider timestamps; a patch
/// without one falls back to last-write-wins.
pub(crate) fn is_stale(existing: Option<DateTime<Utc>>, incoming: Option<DateTime<Utc>>) -> bool {
  match (existing, incoming) {
    (Some(have), Some(new)) => new < have,
    _ => false,
  }
}
