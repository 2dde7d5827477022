// src/web/handlers/designer_handlers.rs

use actix_web::{web, HttpResponse};
use decorvista::{DesignerId, SlotTime, UserId};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[derive(Deserialize, Debug)]
pub struct CreateDesignerPayload {
  /// Account that will own the designer profile.
  pub user_id: Uuid,
  pub name: String,
}

#[instrument(name = "handler::list_designers", skip(app_state))]
pub async fn list_designers_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let designers = app_state.catalog.designers().await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "designers": designers })))
}

#[instrument(name = "handler::get_designer", skip(app_state, path), fields(designer_id = %path.as_ref()))]
pub async fn get_designer_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let designer = app_state.catalog.designer(DesignerId(path.into_inner())).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "designer": designer })))
}

#[instrument(name = "handler::create_designer", skip(app_state, payload), fields(user_id = %user.user_id()))]
pub async fn create_designer_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateDesignerPayload>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let CreateDesignerPayload { user_id, name } = payload.into_inner();
  let designer = app_state
    .catalog
    .create_designer(user.actor(), UserId(user_id), name)
    .await?;
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Designer created.",
    "designer": designer
  })))
}

/// Body: `{"date": "2024-06-01", "from": "09:00", "to": "10:00"}`.
#[instrument(name = "handler::add_slot", skip(app_state, path, payload), fields(designer_id = %path.as_ref()))]
pub async fn add_slot_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<SlotTime>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let slot = app_state
    .catalog
    .add_slot(user.actor(), DesignerId(path.into_inner()), payload.into_inner())
    .await?;
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "message": "Availability slot added.",
    "slot": slot
  })))
}

#[instrument(name = "handler::available_slots", skip(app_state, path), fields(designer_id = %path.as_ref()))]
pub async fn available_slots_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let slots = app_state.catalog.available_slots(DesignerId(path.into_inner())).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "slots": slots })))
}
