// src/web/routes.rs

use actix_web::{web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{cart_handlers, consultation_handlers, designer_handlers, order_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error))
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}/restock", web::post().to(product_handlers::restock_product_handler)),
        )
        .service(
          web::scope("/designers")
            .route("", web::get().to(designer_handlers::list_designers_handler))
            .route("", web::post().to(designer_handlers::create_designer_handler))
            .route("/{designer_id}", web::get().to(designer_handlers::get_designer_handler))
            .route("/{designer_id}/slots", web::get().to(designer_handlers::available_slots_handler))
            .route("/{designer_id}/slots", web::post().to(designer_handlers::add_slot_handler))
            .route(
              "/{designer_id}/consultations",
              web::get().to(consultation_handlers::designer_consultations_handler),
            ),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("", web::delete().to(cart_handlers::clear_cart_handler))
            .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/items/{product_id}", web::put().to(cart_handlers::update_cart_item_handler))
            .route("/items/{product_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::post().to(order_handlers::create_order_handler))
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
            .route("/{order_id}/status", web::patch().to(order_handlers::update_order_status_handler)),
        )
        .route("/consultations", web::get().to(consultation_handlers::my_consultations_handler)),
    );
}
