// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  // Commerce platform (Scalev)
  pub scalev_api_base: String,
  pub scalev_api_key: String,
  pub scalev_store_unique_id: String,
  pub scalev_payment_method: String,
  pub scalev_public_order_base: String,
  pub scalev_webhook_signing_secret: String,

  // Payment gateway (Midtrans)
  pub midtrans_server_key: String,
  pub midtrans_client_key: Option<String>,
  pub midtrans_is_production: bool,

  // Subscription billing (Lemon Squeezy)
  pub lemonsqueezy_webhook_secret: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    // Required provider settings fail closed: a missing key is a startup
    // error, never a silently-skipped verification.
    let scalev_api_base = get_env("SCALEV_API_BASE")?;
    let scalev_api_key = get_env("SCALEV_API_KEY")?;
    let scalev_store_unique_id = get_env("SCALEV_STORE_UNIQUE_ID")?;
    let scalev_payment_method = get_env("SCALEV_PAYMENT_METHOD").unwrap_or_else(|_| "invoice".to_string());
    let scalev_public_order_base = get_env("SCALEV_PUBLIC_ORDER_BASE")?;
    let scalev_webhook_signing_secret = get_env("SCALEV_WEBHOOK_SIGNING_SECRET")?;

    let midtrans_server_key = get_env("MIDTRANS_SERVER_KEY")?;
    let midtrans_client_key = get_env("MIDTRANS_CLIENT_KEY").ok();
    let midtrans_is_production = get_env("MIDTRANS_IS_PRODUCTION")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid MIDTRANS_IS_PRODUCTION value: {}", e)))?;

    let lemonsqueezy_webhook_secret = get_env("LEMONSQUEEZY_WEBHOOK_SECRET")?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      scalev_api_base,
      scalev_api_key,
      scalev_store_unique_id,
      scalev_payment_method,
      scalev_public_order_base,
      scalev_webhook_signing_secret,
      midtrans_server_key,
      midtrans_client_key,
      midtrans_is_production,
      lemonsqueezy_webhook_secret,
    })
  }
}
