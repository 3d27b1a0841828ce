// src/services/commerce_api.rs

//! Client for the external commerce platform's order API.
//!
//! The trait seam exists so handlers and the checkout service never depend
//! on the concrete HTTP client; tests inject a counting stub instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct OrderVariantPayload {
  pub variant_unique_id: String,
  pub quantity: u32,
}

/// Wire body for `POST {base}/order`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
  pub store_unique_id: String,
  pub customer_name: String,
  pub customer_phone: String,
  pub customer_email: String,
  pub ordervariants: Vec<OrderVariantPayload>,
  pub payment_method: String,
}

/// Successful order creation. `id` is normalized to a string; some platform
/// responses carry numeric ids.
#[derive(Debug, Clone)]
pub struct CreateOrderResponse {
  pub secret_slug: String,
  pub id: Option<String>,
}

// The platform wraps responses inconsistently: the slug arrives either at
// the top level or nested under `data`.
#[derive(Debug, Deserialize)]
struct OrderEnvelope {
  secret_slug: Option<String>,
  id: Option<serde_json::Value>,
  data: Option<OrderEnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelopeData {
  secret_slug: Option<String>,
  id: Option<serde_json::Value>,
}

fn id_to_string(id: Option<serde_json::Value>) -> Option<String> {
  match id {
    Some(serde_json::Value::String(s)) => Some(s),
    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
    _ => None,
  }
}

#[async_trait]
pub trait CommerceApi: Send + Sync {
  async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse>;

  /// Requests a payment intent for a freshly created order. Failure here is
  /// a partial failure (the order already exists upstream) and is reported
  /// as `AppError::PaymentInit`.
  async fn create_payment(&self, order_id: &str) -> Result<()>;
}

pub struct ScalevClient {
  base_url: String,
  api_key: String,
  client: Client,
}

impl ScalevClient {
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    Self::new(&config.scalev_api_base, &config.scalev_api_key)
  }

  pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
    if base_url.is_empty() || api_key.is_empty() {
      return Err(AppError::Config("Commerce API base URL and key must be set".to_string()));
    }
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
    Ok(Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
      client,
    })
  }
}

#[async_trait]
impl CommerceApi for ScalevClient {
  #[instrument(name = "commerce::create_order", skip(self, request), fields(customer_email = %request.customer_email))]
  async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse> {
    let url = format!("{}/order", self.base_url);
    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.api_key)
      .json(request)
      .send()
      .await
      .map_err(|e| AppError::Upstream { status: 0, body: e.to_string() })?;

    let status = response.status();
    // Read as text first so provider error bodies survive even when they are
    // not JSON.
    let text = response
      .text()
      .await
      .map_err(|e| AppError::Upstream { status: status.as_u16(), body: e.to_string() })?;

    if !status.is_success() {
      return Err(AppError::Upstream { status: status.as_u16(), body: text });
    }

    let envelope: OrderEnvelope = serde_json::from_str(&text)
      .map_err(|_| AppError::Upstream { status: status.as_u16(), body: text.clone() })?;

    let (slug, id) = match envelope.data {
      Some(data) => (
        envelope.secret_slug.or(data.secret_slug),
        id_to_string(envelope.id).or_else(|| id_to_string(data.id)),
      ),
      None => (envelope.secret_slug, id_to_string(envelope.id)),
    };

    let secret_slug = slug.ok_or_else(|| AppError::Upstream {
      status: status.as_u16(),
      body: format!("Response missing secret_slug: {}", text),
    })?;

    info!(secret_slug = %secret_slug, "Commerce order created.");
    Ok(CreateOrderResponse { secret_slug, id })
  }

  #[instrument(name = "commerce::create_payment", skip(self))]
  async fn create_payment(&self, order_id: &str) -> Result<()> {
    let url = format!("{}/order/{}/payment", self.base_url, order_id);
    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.api_key)
      .send()
      .await
      .map_err(|e| AppError::PaymentInit { status: 0, body: e.to_string() })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(AppError::PaymentInit { status: status.as_u16(), body });
    }

    info!(order_id, "Payment intent created for order.");
    Ok(())
  }
}
