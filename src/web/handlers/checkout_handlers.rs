// src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::{Customer, LineItem};
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct CheckoutItemPayload {
  pub variant_unique_id: String,
  pub name: String,
  pub unit_price: u64,
  pub quantity: u32,
}

#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  pub customer_name: String,
  pub customer_phone: String,
  pub customer_email: String,
  pub items: Vec<CheckoutItemPayload>,
}

// --- Handler Implementation ---

#[instrument(
    name = "handler::start_checkout",
    skip(app_state, req_payload),
    fields(customer_email = %req_payload.customer_email, item_count = req_payload.items.len())
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();

  let request = CheckoutRequest {
    customer: Customer {
      name: payload.customer_name,
      email: payload.customer_email,
      phone: payload.customer_phone,
    },
    items: payload
      .items
      .into_iter()
      .map(|item| LineItem {
        variant_id: item.variant_unique_id,
        name: item.name,
        unit_price: item.unit_price,
        quantity: item.quantity,
      })
      .collect(),
  };

  let outcome = checkout::initiate(
    app_state.commerce.as_ref(),
    app_state.order_store.as_ref(),
    &app_state.config,
    request,
  )
  .await?;

  info!(order_id = %outcome.order_id, "Checkout completed, returning redirect target.");

  Ok(HttpResponse::Ok().json(json!({
    "ok": true,
    "order_id": outcome.order_id,
    "gross_amount": outcome.gross_amount,
    "redirect_url": outcome.redirect_url,
  })))
}
