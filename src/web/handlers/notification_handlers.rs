// src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::signature;
use crate::state::AppState;
use crate::store::{OrderPatch, OrderStore};

/// Server-to-server notification from the payment gateway. The signature
/// lives inside the body (`signature_key`), so parsing precedes
/// verification here; the verified fields are exactly the signed ones.
#[derive(Deserialize, Debug)]
pub struct MidtransNotification {
  pub order_id: String,
  pub status_code: String,
  pub gross_amount: String,
  pub signature_key: String,
  pub transaction_status: String,
  #[serde(default)]
  pub fraud_status: Option<String>,
  #[serde(default)]
  pub transaction_time: Option<String>,
}

/// Gateway amounts arrive as decimal strings ("150000.00"). Only a zero
/// fraction is meaningful for the currencies the gateway settles in.
fn parse_gross_amount(raw: &str) -> Option<u64> {
  let (int_part, frac_part) = match raw.split_once('.') {
    Some((i, f)) => (i, f),
    None => (raw, ""),
  };
  if !frac_part.is_empty() && !frac_part.bytes().all(|b| b == b'0') {
    return None;
  }
  int_part.parse::<u64>().ok()
}

#[instrument(
    name = "handler::midtrans_notification",
    skip(app_state, body),
    fields(payload_bytes = body.len())
)]
pub async fn midtrans_notification_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  // 1. Parse the typed payload; the signature covers body fields, not bytes.
  let notification: MidtransNotification = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed notification body: {}", e)))?;

  // 2. Verify the SHA-512 field signature.
  let verified = signature::verify_gateway_signature(
    &notification.order_id,
    &notification.status_code,
    &notification.gross_amount,
    &app_state.config.midtrans_server_key,
    &notification.signature_key,
  )?;
  if !verified {
    return Err(AppError::Signature("Invalid signature".to_string()));
  }

  let status = OrderStatus::from_gateway(&notification.transaction_status);
  info!(
    order_id = %notification.order_id,
    transaction_status = %notification.transaction_status,
    fraud_status = ?notification.fraud_status,
    mapped_status = ?status,
    "Gateway notification verified."
  );

  // 3. The signed amount must match what we recorded at checkout. A valid
  //    signature over a different amount means the gateway charged something
  //    other than the order we know; neither paid nor failed is safe to
  //    record, so ack without transitioning. Records first seen through the
  //    gateway (no recorded amount yet) adopt the signed amount instead.
  let echoed = parse_gross_amount(&notification.gross_amount);
  let existing = app_state.order_store.get(&notification.order_id).await?;
  let known_amount = existing.as_ref().map(|order| order.gross_amount).filter(|&amount| amount > 0);
  if let Some(stored) = known_amount {
    if echoed != Some(stored) {
      warn!(
        order_id = %notification.order_id,
        stored_amount = stored,
        echoed_amount = %notification.gross_amount,
        "Gateway notification amount disagrees with stored order; not applied."
      );
      return Ok(HttpResponse::Ok().json(json!({ "received": true })));
    }
  }

  // Gateway timestamps are local-format ("2024-06-01 10:20:30"); parsed for
  // ordering between this provider's own deliveries only.
  let event_time = notification
    .transaction_time
    .as_deref()
    .and_then(|raw| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
    .map(|naive| naive.and_utc());

  // 4. Record the mapped status; unrecognized transaction states are stored
  //    as Unknown rather than dropped.
  let patch_amount = if known_amount.is_none() { echoed } else { None };
  let order = app_state
    .order_store
    .upsert(
      &notification.order_id,
      status,
      OrderPatch { gross_amount: patch_amount, event_time, ..Default::default() },
    )
    .await?;

  info!(order_id = %order.order_id, status = ?order.status, "Gateway notification applied.");

  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
