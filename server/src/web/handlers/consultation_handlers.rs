// src/web/handlers/consultation_handlers.rs

use actix_web::{web, HttpResponse};
use decorvista::DesignerId;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[instrument(name = "handler::my_consultations", skip(app_state), fields(user_id = %user.user_id()))]
pub async fn my_consultations_handler(
  app_state: web::Data<AppState>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let consultations = app_state.orders.consultations_for_user(user.user_id()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "consultations": consultations })))
}

#[instrument(
  name = "handler::designer_consultations",
  skip(app_state, path),
  fields(user_id = %user.user_id(), designer_id = %path.as_ref())
)]
pub async fn designer_consultations_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  user: CurrentUser,
) -> Result<HttpResponse, AppError> {
  let consultations = app_state
    .orders
    .consultations_for_designer(user.actor(), DesignerId(path.into_inner()))
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "consultations": consultations })))
}
