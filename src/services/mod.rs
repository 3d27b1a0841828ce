// src/services/mod.rs

// Declare service modules
pub mod checkout;
pub mod commerce_api;
pub mod credits;

pub use commerce_api::{CommerceApi, ScalevClient};
pub use credits::CreditLedger;
