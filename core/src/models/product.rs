// src/models/product.rs

use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub title: String,
  pub price_cents: i64,
  /// Units on hand. Only the store's guarded take/return primitives change it.
  pub inventory: u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn new(title: impl Into<String>, price_cents: i64, inventory: u32) -> Self {
    let now = Utc::now();
    Self {
      id: ProductId::new(),
      title: title.into(),
      price_cents,
      inventory,
      created_at: now,
      updated_at: now,
    }
  }
}
