// src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use decorvista::ProductId;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  pub quantity: u32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartItemPayload {
  pub quantity: u32,
}

#[instrument(name = "handler::get_cart", skip(app_state), fields(user_id = %user.user_id()))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let cart = app_state.carts.cart(user.user_id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, payload, user),
  fields(user_id = %user.user_id(), product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<AddToCartPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let item = app_state
    .carts
    .add_item(user.user_id(), ProductId(payload.product_id), payload.quantity)
    .await?;
  info!(quantity = item.quantity, "Item added to cart.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Item added to cart successfully.",
    "cart_item": item
  })))
}

#[instrument(
  name = "handler::update_cart_item",
  skip(app_state, path, payload, user),
  fields(user_id = %user.user_id(), product_id = %path.as_ref())
)]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateCartItemPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let cart = app_state
    .carts
    .update_item(user.user_id(), ProductId(path.into_inner()), payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

#[instrument(
  name = "handler::remove_cart_item",
  skip(app_state, path, user),
  fields(user_id = %user.user_id(), product_id = %path.as_ref())
)]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let cart = app_state
    .carts
    .remove_item(user.user_id(), ProductId(path.into_inner()))
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

#[instrument(name = "handler::clear_cart", skip(app_state), fields(user_id = %user.user_id()))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let cart = app_state.carts.clear(user.user_id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}
