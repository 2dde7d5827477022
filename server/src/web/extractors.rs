// src/web/extractors.rs

use actix_web::{FromRequest, HttpRequest};
use decorvista::{Actor, Role, UserId};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The calling account, taken from the `X-User-ID` / `X-User-Role` headers.
///
/// Stand-in for a real session or token layer sitting in front of the API.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Actor);

impl CurrentUser {
  pub fn user_id(&self) -> UserId {
    self.0.user_id
  }

  pub fn actor(&self) -> Actor {
    self.0
  }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name).and_then(|value| value.to_str().ok())
}

fn identify(req: &HttpRequest) -> Result<CurrentUser, AppError> {
  let user_id = header(req, USER_ID_HEADER)
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    .ok_or_else(|| AppError::Auth(format!("Missing or invalid {} header.", USER_ID_HEADER)))?;
  let role = match header(req, USER_ROLE_HEADER) {
    Some(raw) => raw
      .parse::<Role>()
      .map_err(|_| AppError::Auth(format!("Invalid {} header.", USER_ROLE_HEADER)))?,
    None => Role::default(),
  };
  Ok(CurrentUser(Actor::new(UserId(user_id), role)))
}

impl FromRequest for CurrentUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = identify(req);
    if let Err(e) = &result {
      warn!(path = %req.path(), error = %e, "Rejected unauthenticated request.");
    }
    ready(result)
  }
}
