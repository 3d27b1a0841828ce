// src/signature.rs

//! Webhook signature verification.
//!
//! Each provider signs its deliveries differently: the commerce platform
//! sends base64 HMAC-SHA256 over the raw body, the billing provider sends
//! the same digest hex-encoded, and the payment gateway hashes a field
//! concatenation with SHA-512. All comparisons are constant-time.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(secret: &str, raw_body: &[u8]) -> Result<Vec<u8>> {
  if secret.is_empty() {
    // A blank secret must fail closed, never degrade to "skip verification".
    return Err(AppError::Config("Webhook signing secret is not set".to_string()));
  }
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Config(format!("Invalid webhook signing secret: {}", e)))?;
  mac.update(raw_body);
  Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_eq(expected: &str, supplied: &str) -> bool {
  // subtle's ct_eq short-circuits only on length, which is public information
  // for fixed-width digests.
  expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Commerce-platform scheme: `base64(HMAC-SHA256(secret, raw_body))`,
/// delivered in the `X-Scalev-Hmac-Sha256` header.
pub fn verify_hmac_sha256_base64(secret: &str, raw_body: &[u8], supplied: &str) -> Result<bool> {
  use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
  use base64::Engine;

  let expected = BASE64_STANDARD.encode(hmac_sha256(secret, raw_body)?);
  Ok(constant_time_eq(&expected, supplied))
}

/// Subscription-billing scheme: `hex(HMAC-SHA256(secret, raw_body))`,
/// delivered in the `X-Signature` header.
pub fn verify_hmac_sha256_hex(secret: &str, raw_body: &[u8], supplied: &str) -> Result<bool> {
  let expected = hex::encode(hmac_sha256(secret, raw_body)?);
  Ok(constant_time_eq(&expected, supplied))
}

/// Payment-gateway scheme: `hex(SHA-512(order_id + status_code + gross_amount
/// + server_key))`, echoed back in the notification's `signature_key` field.
pub fn verify_gateway_signature(
  order_id: &str,
  status_code: &str,
  gross_amount: &str,
  server_key: &str,
  supplied: &str,
) -> Result<bool> {
  if server_key.is_empty() {
    return Err(AppError::Config("Payment gateway server key is not set".to_string()));
  }
  let mut hasher = Sha512::new();
  hasher.update(order_id.as_bytes());
  hasher.update(status_code.as_bytes());
  hasher.update(gross_amount.as_bytes());
  hasher.update(server_key.as_bytes());
  let expected = hex::encode(hasher.finalize());
  Ok(constant_time_eq(&expected, supplied))
}
