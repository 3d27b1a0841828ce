// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storefront_gateway::config::AppConfig;
use storefront_gateway::services::{CreditLedger, ScalevClient};
use storefront_gateway::state::AppState;
use storefront_gateway::store::InMemoryOrderStore;
use storefront_gateway::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting storefront gateway server...");

  // Load application configuration. Required provider secrets fail closed
  // here, before the server binds.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  tracing::info!(
    production_mode = app_config.midtrans_is_production,
    client_key_present = app_config.midtrans_client_key.is_some(),
    "Payment gateway configuration loaded."
  );

  let commerce = match ScalevClient::from_config(&app_config) {
    Ok(client) => Arc::new(client),
    Err(e) => {
      tracing::error!(error = %e, "Failed to construct commerce API client.");
      panic!("Commerce client error: {}", e);
    }
  };

  // Create AppState. The store is memory-resident; swap the concrete type
  // here to move to a durable backend.
  let app_state = AppState {
    order_store: Arc::new(InMemoryOrderStore::new()),
    commerce,
    credits: Arc::new(CreditLedger::new()),
    config: app_config.clone(),
  };

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
