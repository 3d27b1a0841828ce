// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::OrderStore;

#[derive(Deserialize, Debug)]
pub struct OrderStatusQuery {
  pub order_id: Option<String>,
}

#[instrument(name = "handler::order_status", skip(app_state, query))]
pub async fn order_status_handler(
  app_state: web::Data<AppState>,
  query: web::Query<OrderStatusQuery>,
) -> Result<HttpResponse, AppError> {
  let order_id = query
    .into_inner()
    .order_id
    .filter(|id| !id.is_empty())
    .ok_or_else(|| AppError::Validation("order_id is required".to_string()))?;

  let order = app_state
    .order_store
    .get(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No order with id '{}'", order_id)))?;

  Ok(HttpResponse::Ok().json(json!({ "ok": true, "order": order })))
}
