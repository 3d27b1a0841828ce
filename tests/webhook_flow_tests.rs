// Integration tests for the storefront gateway.
//
// HTTP-level tests using actix_web::test utilities to exercise the full
// Actix service configuration without starting a real HTTP server. The
// commerce platform is replaced by a counting stub so checkout paths can be
// asserted without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::{test, web, App};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use storefront_gateway::config::AppConfig;
use storefront_gateway::errors::{AppError, Result as AppResult};
use storefront_gateway::models::OrderStatus;
use storefront_gateway::services::commerce_api::{CommerceApi, CreateOrderRequest, CreateOrderResponse};
use storefront_gateway::services::CreditLedger;
use storefront_gateway::state::AppState;
use storefront_gateway::store::{InMemoryOrderStore, OrderStore};
use storefront_gateway::web::configure_app_routes;

const SCALEV_SECRET: &str = "whsec_scalev_test";
const LEMONSQUEEZY_SECRET: &str = "whsec_ls_test";
const MIDTRANS_SERVER_KEY: &str = "SB-Mid-server-test";

// ─── Stub commerce client ─────────────────────────────────────────

/// Counts calls and returns canned responses; `fail_order_creation` /
/// `fail_payment` switch the two upstream failure modes on.
struct StubCommerceApi {
  create_order_calls: AtomicUsize,
  create_payment_calls: AtomicUsize,
  fail_order_creation: bool,
  fail_payment: bool,
}

impl StubCommerceApi {
  fn ok() -> Self {
    Self {
      create_order_calls: AtomicUsize::new(0),
      create_payment_calls: AtomicUsize::new(0),
      fail_order_creation: false,
      fail_payment: false,
    }
  }

  fn failing_order_creation() -> Self {
    Self { fail_order_creation: true, ..Self::ok() }
  }

  fn failing_payment() -> Self {
    Self { fail_payment: true, ..Self::ok() }
  }
}

#[async_trait]
impl CommerceApi for StubCommerceApi {
  async fn create_order(&self, _request: &CreateOrderRequest) -> AppResult<CreateOrderResponse> {
    self.create_order_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_order_creation {
      return Err(AppError::Upstream {
        status: 422,
        body: r#"{"error":"variant not purchasable"}"#.to_string(),
      });
    }
    Ok(CreateOrderResponse {
      secret_slug: "slug-test-1".to_string(),
      id: Some("90210".to_string()),
    })
  }

  async fn create_payment(&self, _order_id: &str) -> AppResult<()> {
    self.create_payment_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_payment {
      return Err(AppError::PaymentInit {
        status: 503,
        body: "payment channel unavailable".to_string(),
      });
    }
    Ok(())
  }
}

// ─── Harness ──────────────────────────────────────────────────────

fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    scalev_api_base: "https://api.scalev.test/v2".to_string(),
    scalev_api_key: "sk_test".to_string(),
    scalev_store_unique_id: "store_abc".to_string(),
    scalev_payment_method: "invoice".to_string(),
    scalev_public_order_base: "https://shop.test/o".to_string(),
    scalev_webhook_signing_secret: SCALEV_SECRET.to_string(),
    midtrans_server_key: MIDTRANS_SERVER_KEY.to_string(),
    midtrans_client_key: None,
    midtrans_is_production: false,
    lemonsqueezy_webhook_secret: LEMONSQUEEZY_SECRET.to_string(),
  }
}

fn test_state(commerce: Arc<dyn CommerceApi>) -> AppState {
  AppState {
    order_store: Arc::new(InMemoryOrderStore::new()),
    commerce,
    credits: Arc::new(CreditLedger::new()),
    config: Arc::new(test_config()),
  }
}

macro_rules! test_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn sign_scalev(body: &[u8]) -> String {
  let mut mac = Hmac::<Sha256>::new_from_slice(SCALEV_SECRET.as_bytes()).unwrap();
  mac.update(body);
  BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

fn sign_lemonsqueezy(body: &[u8]) -> String {
  let mut mac = Hmac::<Sha256>::new_from_slice(LEMONSQUEEZY_SECRET.as_bytes()).unwrap();
  mac.update(body);
  hex::encode(mac.finalize().into_bytes())
}

fn sign_midtrans(order_id: &str, status_code: &str, gross_amount: &str) -> String {
  let mut hasher = Sha512::new();
  hasher.update(format!("{}{}{}{}", order_id, status_code, gross_amount, MIDTRANS_SERVER_KEY));
  hex::encode(hasher.finalize())
}

fn checkout_body() -> serde_json::Value {
  serde_json::json!({
    "customer_name": "Ayu Lestari",
    "customer_phone": "+6281234567890",
    "customer_email": "ayu@example.com",
    "items": [
      { "variant_unique_id": "var_sticker", "name": "Sticker Pack", "unit_price": 25000, "quantity": 2 },
      { "variant_unique_id": "var_print", "name": "Art Print", "unit_price": 100000, "quantity": 1 }
    ]
  })
}

// ─── Scenario A: commerce webhook marks order paid ────────────────

#[actix_web::test]
async fn commerce_webhook_marks_order_paid_and_status_query_reflects_it() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body =
    br#"{"event":"order.payment_status_changed","data":{"secret_slug":"slug-a","status":"paid"}}"#.to_vec();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .insert_header(("X-Scalev-Hmac-Sha256", sign_scalev(&body)))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let order = state.order_store.get("slug-a").await.unwrap().expect("order recorded");
  assert_eq!(order.status, OrderStatus::Paid);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders/status?order_id=slug-a")
    .to_request();
  let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(resp["ok"], true);
  assert_eq!(resp["order"]["status"], "paid");
}

// ─── Scenario B: corrupted signature leaves the store untouched ───

#[actix_web::test]
async fn commerce_webhook_with_bad_signature_is_rejected_without_mutation() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body =
    br#"{"event":"order.payment_status_changed","data":{"secret_slug":"slug-b","status":"paid"}}"#.to_vec();
  let mut signature = sign_scalev(&body);
  signature.replace_range(0..1, if signature.starts_with('A') { "B" } else { "A" });

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .insert_header(("X-Scalev-Hmac-Sha256", signature))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 401);

  assert!(state.order_store.get("slug-b").await.unwrap().is_none());
  assert!(state.order_store.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn commerce_webhook_with_missing_signature_header_is_rejected() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .set_payload(br#"{"event":"order.created"}"#.to_vec())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 401);
}

// ─── Idempotence and event routing ────────────────────────────────

#[actix_web::test]
async fn duplicate_webhook_delivery_is_idempotent() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body =
    br#"{"event":"order.payment_status_changed","data":{"secret_slug":"slug-c","status":"paid"}}"#.to_vec();
  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/api/v1/webhooks/scalev")
      .insert_header(("X-Scalev-Hmac-Sha256", sign_scalev(&body)))
      .set_payload(body.clone())
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
  }

  let all = state.order_store.list().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].status, OrderStatus::Paid);
}

#[actix_web::test]
async fn unlisted_event_type_is_acked_without_mutation() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body = br#"{"event":"order.shipped","data":{"secret_slug":"slug-d","status":"shipped"}}"#.to_vec();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .insert_header(("X-Scalev-Hmac-Sha256", sign_scalev(&body)))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
  assert!(state.order_store.get("slug-d").await.unwrap().is_none());
}

#[actix_web::test]
async fn unrecognized_status_is_recorded_as_unknown() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body =
    br#"{"event":"order.status_changed","data":{"secret_slug":"slug-e","status":"on_hold_review"}}"#.to_vec();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .insert_header(("X-Scalev-Hmac-Sha256", sign_scalev(&body)))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let order = state.order_store.get("slug-e").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Unknown);
}

#[actix_web::test]
async fn malformed_webhook_body_with_valid_signature_is_a_client_error() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body = b"not json at all".to_vec();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/scalev")
    .insert_header(("X-Scalev-Hmac-Sha256", sign_scalev(&body)))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 400);
}

// ─── Scenario C: checkout validation precedes any upstream call ───

#[actix_web::test]
async fn checkout_with_empty_email_never_reaches_the_commerce_api() {
  let stub = Arc::new(StubCommerceApi::ok());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let mut body = checkout_body();
  body["customer_email"] = serde_json::Value::String(String::new());
  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(&body).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 400);

  assert_eq!(stub.create_order_calls.load(Ordering::SeqCst), 0);
  assert_eq!(stub.create_payment_calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn checkout_with_zero_quantity_never_reaches_the_commerce_api() {
  let stub = Arc::new(StubCommerceApi::ok());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let mut body = checkout_body();
  body["items"][0]["quantity"] = serde_json::json!(0);
  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(&body).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 400);
  assert_eq!(stub.create_order_calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn successful_checkout_records_pending_order_and_returns_redirect() {
  let stub = Arc::new(StubCommerceApi::ok());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(checkout_body()).to_request();
  let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(resp["ok"], true);
  assert_eq!(resp["order_id"], "slug-test-1");
  assert_eq!(resp["gross_amount"], 150_000);
  assert_eq!(resp["redirect_url"], "https://shop.test/o/slug-test-1/success");

  assert_eq!(stub.create_order_calls.load(Ordering::SeqCst), 1);
  assert_eq!(stub.create_payment_calls.load(Ordering::SeqCst), 1);

  let order = state.order_store.get("slug-test-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.gross_amount, 150_000);
  assert_eq!(order.customer.as_ref().unwrap().email, "ayu@example.com");
}

#[actix_web::test]
async fn upstream_order_failure_surfaces_provider_detail() {
  let stub = Arc::new(StubCommerceApi::failing_order_creation());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(checkout_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 502);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "upstream_error");
  assert_eq!(body["status"], 422);
  assert!(body["details"].as_str().unwrap().contains("variant not purchasable"));
}

#[actix_web::test]
async fn payment_initiation_failure_is_distinct_and_keeps_the_order() {
  let stub = Arc::new(StubCommerceApi::failing_payment());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(checkout_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 502);
  let body: serde_json::Value = test::read_body_json(resp).await;
  assert_eq!(body["code"], "payment_init_error");

  // Partial failure: the order was created upstream and is recorded locally.
  let order = state.order_store.get("slug-test-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
}

// ─── Scenario D: gateway settlement transitions pending → paid ────

#[actix_web::test]
async fn gateway_settlement_marks_checkout_order_paid_exactly_once() {
  let stub = Arc::new(StubCommerceApi::ok());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  // Checkout records the order as PENDING with gross 150000.
  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(checkout_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let notification = serde_json::json!({
    "order_id": "slug-test-1",
    "status_code": "200",
    "gross_amount": "150000.00",
    "signature_key": sign_midtrans("slug-test-1", "200", "150000.00"),
    "transaction_status": "settlement",
  });

  // Deliver twice; the transition happens exactly once and stays Paid.
  for _ in 0..2 {
    let req = test::TestRequest::post()
      .uri("/api/v1/payments/midtrans/notification")
      .set_json(&notification)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
  }

  let order = state.order_store.get("slug-test-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Paid);
  assert_eq!(state.order_store.list().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn gateway_notification_with_tampered_amount_is_not_applied() {
  let stub = Arc::new(StubCommerceApi::ok());
  let state = test_state(stub.clone());
  let app = test_app!(state);

  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(checkout_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  // Valid signature over an amount that disagrees with the stored order.
  let notification = serde_json::json!({
    "order_id": "slug-test-1",
    "status_code": "200",
    "gross_amount": "1.00",
    "signature_key": sign_midtrans("slug-test-1", "200", "1.00"),
    "transaction_status": "settlement",
  });
  let req = test::TestRequest::post()
    .uri("/api/v1/payments/midtrans/notification")
    .set_json(&notification)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200); // acked, but not applied

  let order = state.order_store.get("slug-test-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
}

#[actix_web::test]
async fn gateway_notification_with_invalid_signature_is_rejected() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let notification = serde_json::json!({
    "order_id": "PD-77",
    "status_code": "200",
    "gross_amount": "5000.00",
    "signature_key": "deadbeef",
    "transaction_status": "settlement",
  });
  let req = test::TestRequest::post()
    .uri("/api/v1/payments/midtrans/notification")
    .set_json(&notification)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 401);
  assert!(state.order_store.get("PD-77").await.unwrap().is_none());
}

#[actix_web::test]
async fn gateway_failure_statuses_mark_order_failed() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let notification = serde_json::json!({
    "order_id": "PD-88",
    "status_code": "202",
    "gross_amount": "5000.00",
    "signature_key": sign_midtrans("PD-88", "202", "5000.00"),
    "transaction_status": "expire",
  });
  let req = test::TestRequest::post()
    .uri("/api/v1/payments/midtrans/notification")
    .set_json(&notification)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let order = state.order_store.get("PD-88").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Failed);
}

// ─── Billing webhook ──────────────────────────────────────────────

#[actix_web::test]
async fn billing_order_created_grants_mapped_credits() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body = serde_json::to_vec(&serde_json::json!({
    "meta": { "custom_data": { "user_id": "user-1", "email": "ayu@example.com" } },
    "data": { "attributes": { "first_order_item": { "variant_name": "Builder (monthly)" } } }
  }))
  .unwrap();

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/lemonsqueezy")
    .insert_header(("X-Signature", sign_lemonsqueezy(&body)))
    .insert_header(("X-Event-Name", "order_created"))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
  assert_eq!(state.credits.balance("user-1"), 80);
}

#[actix_web::test]
async fn billing_events_other_than_order_created_grant_nothing() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body = serde_json::to_vec(&serde_json::json!({
    "meta": { "custom_data": { "user_id": "user-1" } },
    "data": { "attributes": { "variant_name": "Pro" } }
  }))
  .unwrap();

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/lemonsqueezy")
    .insert_header(("X-Signature", sign_lemonsqueezy(&body)))
    .insert_header(("X-Event-Name", "subscription_updated"))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
  assert_eq!(state.credits.balance("user-1"), 0);
}

#[actix_web::test]
async fn billing_webhook_with_bad_signature_is_rejected() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let body = b"{}".to_vec();
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/lemonsqueezy")
    .insert_header(("X-Signature", "0000"))
    .insert_header(("X-Event-Name", "order_created"))
    .set_payload(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 401);
}

// ─── Order status query ───────────────────────────────────────────

#[actix_web::test]
async fn order_status_requires_order_id_and_404s_on_missing_records() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/v1/orders/status").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 400);

  let req = test::TestRequest::get().uri("/api/v1/orders/status?order_id=nope").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn health_check_responds_ok() {
  let state = test_state(Arc::new(StubCommerceApi::ok()));
  let app = test_app!(state);

  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
}
