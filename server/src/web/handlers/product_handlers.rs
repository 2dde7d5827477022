// src/web/handlers/product_handlers.rs

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
pub struct ListProductsQuery {
  pub page: Option<u32>,
  pub per_page: Option<u32>,
}

#[derive(Deserialize, Debug)]
pub struct CreateProductPayload {
  pub title: String,
  pub price_cents: i64,
  #[serde(default)]
  pub inventory: u32,
}

#[derive(Deserialize, Debug)]
pub struct RestockPayload {
  pub quantity: u32,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let page = app_state.catalog.list_products(query.page, query.per_page).await?;
  info!(returned = page.items.len(), total = page.total, "Products fetched.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "products": page.items,
    "pagination": {
      "page": page.page,
      "per_page": page.per_page,
      "total": page.total,
      "total_pages": page.total_pages(),
    }
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.product(ProductId(path.into_inner())).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::create_product", skip(app_state, payload), fields(user_id = %user.user_id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateProductPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let CreateProductPayload {
    title,
    price_cents,
    inventory,
  } = payload.into_inner();
  let product = app_state
    .catalog
    .create_product(user.actor(), title, price_cents, inventory)
    .await?;
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Product created.",
    "product": product
  })))
}

#[instrument(name = "handler::restock_product", skip(app_state, path, payload), fields(product_id = %path.as_ref()))]
pub async fn restock_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<RestockPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .catalog
    .restock(user.actor(), ProductId(path.into_inner()), payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "Product restocked.",
    "product": product
  })))
}
