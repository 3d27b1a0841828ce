// src/services/credits.rs

//! Credit ledger fed by the subscription-billing webhook. Purchases of a
//! known plan variant grant a fixed number of credits to the buyer.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Plan variant name → credits granted. Matching is substring-based because
/// the billing provider decorates variant names ("Pro (monthly)" etc.).
pub fn credits_for_variant(variant_name: &str) -> Option<u32> {
  let lower = variant_name.to_lowercase();
  if lower.contains("starter") {
    Some(30)
  } else if lower.contains("builder") {
    Some(80)
  } else if lower.contains("pro") {
    Some(200)
  } else if lower.contains("studio") {
    Some(500)
  } else {
    None
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditGrant {
  pub user_id: String,
  pub email: Option<String>,
  pub credits: u32,
  pub action: String,
  pub granted_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct CreditLedger {
  grants: RwLock<HashMap<String, Vec<CreditGrant>>>,
}

impl CreditLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn grant(&self, user_id: &str, email: Option<String>, credits: u32, action: String) -> CreditGrant {
    let grant = CreditGrant {
      user_id: user_id.to_string(),
      email,
      credits,
      action,
      granted_at: Utc::now(),
    };
    self
      .grants
      .write()
      .entry(user_id.to_string())
      .or_default()
      .push(grant.clone());
    info!(user_id, credits, action = %grant.action, "Credits granted.");
    grant
  }

  pub fn balance(&self, user_id: &str) -> u64 {
    self
      .grants
      .read()
      .get(user_id)
      .map(|grants| grants.iter().map(|g| u64::from(g.credits)).sum())
      .unwrap_or(0)
  }

  pub fn history(&self, user_id: &str) -> Vec<CreditGrant> {
    self.grants.read().get(user_id).cloned().unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn variant_names_map_to_credit_amounts() {
    assert_eq!(credits_for_variant("Starter"), Some(30));
    assert_eq!(credits_for_variant("Builder (yearly)"), Some(80));
    assert_eq!(credits_for_variant("PRO plan"), Some(200));
    assert_eq!(credits_for_variant("Studio"), Some(500));
    assert_eq!(credits_for_variant("Enterprise"), None);
  }

  #[test]
  fn grants_accumulate_per_user() {
    let ledger = CreditLedger::new();
    ledger.grant("user-1", Some("a@example.com".to_string()), 30, "Starter purchase".to_string());
    ledger.grant("user-1", None, 200, "Pro purchase".to_string());
    ledger.grant("user-2", None, 80, "Builder purchase".to_string());

    assert_eq!(ledger.balance("user-1"), 230);
    assert_eq!(ledger.balance("user-2"), 80);
    assert_eq!(ledger.balance("guest"), 0);
    assert_eq!(ledger.history("user-1").len(), 2);
  }
}
