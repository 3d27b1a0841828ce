// src/services/checkout.rs

//! Checkout initiation: validate caller input, create the order with the
//! commerce platform, record it locally as pending, request payment, and
//! hand back the redirect target.

use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{Customer, LineItem, OrderStatus};
use crate::services::commerce_api::{CommerceApi, CreateOrderRequest, OrderVariantPayload};
use crate::store::{OrderPatch, OrderStore};

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub customer: Customer,
  pub items: Vec<LineItem>,
}

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
  pub order_id: String,
  pub gross_amount: u64,
  pub redirect_url: String,
}

/// Validate customer and line items, returning the gross amount. Runs before
/// any network call; a rejected checkout must never reach the provider.
pub fn validate(request: &CheckoutRequest) -> Result<u64> {
  let customer = &request.customer;
  if customer.name.trim().is_empty() || customer.email.trim().is_empty() || customer.phone.trim().is_empty() {
    return Err(AppError::Validation("Missing customer fields".to_string()));
  }
  if request.items.is_empty() {
    return Err(AppError::Validation("No items provided".to_string()));
  }

  let mut gross_amount: u64 = 0;
  for item in &request.items {
    if item.variant_id.trim().is_empty() {
      return Err(AppError::Validation("Invalid items format".to_string()));
    }
    if item.quantity == 0 {
      return Err(AppError::Validation(format!(
        "Item '{}' has zero quantity",
        item.variant_id
      )));
    }
    if item.unit_price == 0 {
      return Err(AppError::Validation(format!(
        "Item '{}' has no price",
        item.variant_id
      )));
    }
    let subtotal = item
      .subtotal()
      .ok_or_else(|| AppError::Validation("Item subtotal overflows".to_string()))?;
    gross_amount = gross_amount
      .checked_add(subtotal)
      .ok_or_else(|| AppError::Validation("Gross amount overflows".to_string()))?;
  }

  Ok(gross_amount)
}

/// Join the configured public order base with the provider slug, normalizing
/// the trailing slash exactly once.
pub fn redirect_url(public_base: &str, secret_slug: &str) -> String {
  format!("{}/{}/success", public_base.trim_end_matches('/'), secret_slug)
}

#[instrument(
  name = "checkout::initiate",
  skip(commerce, store, config, request),
  fields(customer_email = %request.customer.email, item_count = request.items.len())
)]
pub async fn initiate(
  commerce: &dyn CommerceApi,
  store: &dyn OrderStore,
  config: &AppConfig,
  request: CheckoutRequest,
) -> Result<CheckoutOutcome> {
  // 1. Fail fast on malformed input, before any upstream call.
  let gross_amount = validate(&request)?;

  // 2. Create the order with the commerce platform.
  let create_request = CreateOrderRequest {
    store_unique_id: config.scalev_store_unique_id.clone(),
    customer_name: request.customer.name.clone(),
    customer_phone: request.customer.phone.clone(),
    customer_email: request.customer.email.clone(),
    ordervariants: request
      .items
      .iter()
      .map(|item| OrderVariantPayload {
        variant_unique_id: item.variant_id.clone(),
        quantity: item.quantity,
      })
      .collect(),
    payment_method: config.scalev_payment_method.clone(),
  };
  let created = commerce.create_order(&create_request).await?;

  // 3. Record the order locally before payment initiation so webhook
  //    deliveries racing this request find the record.
  store
    .upsert(
      &created.secret_slug,
      OrderStatus::Pending,
      OrderPatch {
        gross_amount: Some(gross_amount),
        items: Some(request.items.clone()),
        customer: Some(request.customer.clone()),
        event_time: None,
      },
    )
    .await?;

  // 4. Request a payment intent. The order already exists upstream, so this
  //    failure is surfaced distinctly from order creation.
  let payment_ref = created.id.as_deref().unwrap_or(&created.secret_slug);
  if let Err(err) = commerce.create_payment(payment_ref).await {
    warn!(
      order_id = %created.secret_slug,
      error = %err,
      "Order created but payment initiation failed."
    );
    return Err(err);
  }

  let redirect = redirect_url(&config.scalev_public_order_base, &created.secret_slug);
  info!(order_id = %created.secret_slug, gross_amount, "Checkout initiated.");

  Ok(CheckoutOutcome {
    order_id: created.secret_slug,
    gross_amount,
    redirect_url: redirect,
  })
}
