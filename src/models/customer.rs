// src/models/customer.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
  pub name: String,
  pub email: String,
  pub phone: String,
}
