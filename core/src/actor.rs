// src/actor.rs

//! The caller on whose behalf a service operation runs.

use crate::error::{CommerceError, CommerceResult};
use crate::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Homeowner,
  Designer,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Homeowner => "homeowner",
      Role::Designer => "designer",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = CommerceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "homeowner" | "user" => Ok(Role::Homeowner),
      "designer" => Ok(Role::Designer),
      "admin" => Ok(Role::Admin),
      other => Err(CommerceError::Validation(format!("Unknown role '{}'", other))),
    }
  }
}

/// Identity plus role of whoever is calling into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: UserId,
  pub role: Role,
}

impl Actor {
  pub fn new(user_id: UserId, role: Role) -> Self {
    Self { user_id, role }
  }

  pub fn homeowner(user_id: UserId) -> Self {
    Self::new(user_id, Role::Homeowner)
  }

  pub fn admin(user_id: UserId) -> Self {
    Self::new(user_id, Role::Admin)
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  pub fn require_admin(&self, action: &str) -> CommerceResult<()> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(CommerceError::Forbidden(format!("Only administrators may {}", action)))
    }
  }
}
