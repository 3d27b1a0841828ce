// src/models/line_item.rs

use serde::{Deserialize, Serialize};

/// One product variant in a checkout. `unit_price` is denominated in the
/// smallest unit the payment gateway accepts (whole rupiah for Midtrans).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
  pub variant_id: String,
  pub name: String,
  pub unit_price: u64,
  pub quantity: u32,
}

impl LineItem {
  pub fn subtotal(&self) -> Option<u64> {
    self.unit_price.checked_mul(u64::from(self.quantity))
  }
}
