// src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::services::credits::credits_for_variant;
use crate::signature;
use crate::state::AppState;
use crate::store::{OrderPatch, OrderStore};

/// Commerce-platform events this system understands. Anything else is
/// acknowledged without touching the store.
const SCALEV_ALLOWED_EVENTS: &[&str] = &[
  "order.created",
  "order.payment_status_changed",
  "order.status_changed",
  "order.epayment_created",
];

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> &'a str {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .unwrap_or("")
}

// --- Commerce platform (Scalev) ---

#[derive(Deserialize, Debug)]
struct ScalevWebhookData {
  secret_slug: Option<String>,
  status: Option<String>,
  updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug)]
struct ScalevWebhookPayload {
  event: Option<String>,
  data: Option<ScalevWebhookData>,
}

#[instrument(name = "handler::scalev_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn scalev_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes, // Raw bytes: the signature covers the exact bytes sent
) -> Result<HttpResponse, AppError> {
  // 1. Verify the signature over the raw body before anything else.
  let supplied = header_str(&req, "X-Scalev-Hmac-Sha256");
  let verified =
    signature::verify_hmac_sha256_base64(&app_state.config.scalev_webhook_signing_secret, &body, supplied)?;
  if !verified {
    return Err(AppError::Signature("Invalid signature".to_string()));
  }

  // 2. Parse into the typed payload; a well-signed but malformed body is the
  //    provider's bug and gets a 400.
  let payload: ScalevWebhookPayload = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed webhook body: {}", e)))?;

  // 3. Allow-list the event type. Unknown-but-benign events are acked so the
  //    provider stops redelivering them.
  let event = payload.event.as_deref().unwrap_or("unknown");
  if !SCALEV_ALLOWED_EVENTS.contains(&event) {
    info!(event, "Ignoring unhandled commerce event.");
    return Ok(HttpResponse::Ok().json(json!({ "received": true })));
  }

  let data = payload.data.unwrap_or(ScalevWebhookData {
    secret_slug: None,
    status: None,
    updated_at: None,
  });
  let order_id = data.secret_slug.as_deref().unwrap_or("unknown");
  let raw_status = data.status.as_deref().unwrap_or("unknown");
  let status = OrderStatus::from_commerce(raw_status);

  // 4. Record the event. Mapping failures become Unknown rather than errors;
  //    the delivery itself is never lost.
  let order = app_state
    .order_store
    .upsert(
      order_id,
      status,
      OrderPatch { event_time: data.updated_at, ..Default::default() },
    )
    .await?;

  info!(
    event,
    order_id,
    raw_status,
    status = ?order.status,
    "Commerce webhook applied."
  );

  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

// --- Subscription billing (Lemon Squeezy) ---

#[derive(Deserialize, Debug, Default)]
struct LsCustomData {
  #[serde(alias = "userId")]
  user_id: Option<String>,
  email: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct LsFirstOrderItem {
  variant_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct LsAttributes {
  user_email: Option<String>,
  variant_name: Option<String>,
  first_order_item: Option<LsFirstOrderItem>,
  custom_data: Option<LsCustomData>,
}

#[derive(Deserialize, Debug, Default)]
struct LsData {
  attributes: Option<LsAttributes>,
}

#[derive(Deserialize, Debug, Default)]
struct LsMeta {
  custom_data: Option<LsCustomData>,
}

#[derive(Deserialize, Debug)]
struct LemonSqueezyPayload {
  meta: Option<LsMeta>,
  data: Option<LsData>,
}

#[instrument(name = "handler::lemonsqueezy_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn lemonsqueezy_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  // 1. Signature over raw bytes, hex-encoded HMAC in X-Signature.
  let supplied = header_str(&req, "X-Signature");
  let verified =
    signature::verify_hmac_sha256_hex(&app_state.config.lemonsqueezy_webhook_secret, &body, supplied)?;
  if !verified {
    return Err(AppError::Signature("Invalid signature".to_string()));
  }

  // 2. Event routing happens via header, not body.
  let event_name = header_str(&req, "X-Event-Name").to_string();
  if event_name != "order_created" {
    info!(event_name, "Ignoring unhandled billing event.");
    return Ok(HttpResponse::Ok().json(json!({ "received": true })));
  }

  let payload: LemonSqueezyPayload = serde_json::from_slice(&body)
    .map_err(|e| AppError::Validation(format!("Malformed webhook body: {}", e)))?;

  let attributes = payload.data.unwrap_or_default().attributes.unwrap_or_default();
  // custom_data rides on the attributes for some stores and on meta for
  // others; check both.
  let custom = attributes
    .custom_data
    .or(payload.meta.unwrap_or_default().custom_data)
    .unwrap_or_default();
  let user_id = custom.user_id.unwrap_or_else(|| "guest".to_string());
  let email = custom.email.or(attributes.user_email);
  let variant_name = attributes
    .first_order_item
    .and_then(|item| item.variant_name)
    .or(attributes.variant_name);

  // 3. Only known plan variants grant credits; an unrecognized variant is a
  //    no-op, not an error.
  match variant_name.as_deref().and_then(credits_for_variant) {
    Some(credits) if credits > 0 => {
      let action = format!(
        "LemonSqueezy {}",
        variant_name.as_deref().unwrap_or("purchase")
      );
      app_state.credits.grant(&user_id, email, credits, action);
    }
    _ => {
      warn!(?variant_name, "Billing order without a mapped plan variant.");
    }
  }

  Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
