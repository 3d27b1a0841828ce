// src/state.rs
use crate::config::AppConfig;
use crate::services::{CommerceApi, CreditLedger};
use crate::store::OrderStore;
use std::sync::Arc;

/// Shared per-process state. The store and commerce client sit behind trait
/// objects so tests (and a future durable backend) can swap them without
/// touching handlers.
#[derive(Clone)]
pub struct AppState {
  pub order_store: Arc<dyn OrderStore>,
  pub commerce: Arc<dyn CommerceApi>,
  pub credits: Arc<CreditLedger>,
  pub config: Arc<AppConfig>,
}
