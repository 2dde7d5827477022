// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use decorvista::{CheckoutRequest, OrderId, OrderStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: OrderStatus,
}

/// Checkout. Without `items` (or with an empty list) the caller's cart is used.
#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, user),
  fields(user_id = %user.user_id())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequest>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.create_order(user.user_id(), payload.into_inner()).await?;
  info!(order_id = %order.id, total_cents = order.total_cents, "Checkout completed.");
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Order placed successfully.",
    "order": order
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, user), fields(user_id = %user.user_id()))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.orders_for(user.user_id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": orders })))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, user),
  fields(user_id = %user.user_id(), order_id = %path.as_ref())
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.order(user.actor(), OrderId(path.into_inner())).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, path, payload, user),
  fields(user_id = %user.user_id(), order_id = %path.as_ref(), status = %payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateStatusPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .update_status(user.actor(), OrderId(path.into_inner()), payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("Order is now {}.", order.status),
    "order": order
  })))
}
