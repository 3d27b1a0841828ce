// src/web/routes.rs

use actix_web::web;

// Liveness probe. The store is memory-resident and the commerce client is
// constructed at startup, so there is nothing deeper to check here.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` (and the integration tests) to configure services for
// the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Checkout Routes
      .service(web::scope("/checkout").route(
        "",
        web::post().to(crate::web::handlers::checkout_handlers::start_checkout_handler),
      ))
      // Order status query
      .service(web::scope("/orders").route(
        "/status",
        web::get().to(crate::web::handlers::order_handlers::order_status_handler),
      ))
      // Webhook Routes: one route per provider; header names and signature
      // schemes differ, so these are not collapsed into a generic handler.
      .service(
        web::scope("/webhooks")
          .route(
            "/scalev",
            web::post().to(crate::web::handlers::webhook_handlers::scalev_webhook_handler),
          )
          .route(
            "/lemonsqueezy",
            web::post().to(crate::web::handlers::webhook_handlers::lemonsqueezy_webhook_handler),
          ),
      )
      // Payment gateway server-to-server notifications
      .service(web::scope("/payments").route(
        "/midtrans/notification",
        web::post().to(crate::web::handlers::notification_handlers::midtrans_notification_handler),
      )),
  );
}
