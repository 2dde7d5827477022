// src/models/cart.rs

use crate::ids::{ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  pub product_id: ProductId,
  pub quantity: u32,
  /// Unit price captured when the item was (last) added.
  pub price_at_cents: i64,
}

/// A user's cart. There is at most one per user; checkout empties it but never
/// deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  pub user_id: UserId,
  pub items: Vec<CartItem>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  pub fn empty(user_id: UserId) -> Self {
    Self {
      user_id,
      items: Vec::new(),
      updated_at: Utc::now(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
    self.items.iter().find(|item| item.product_id == product_id)
  }

  /// Adds `quantity` units, merging with an existing line for the same product.
  /// The line's price is refreshed to `price_at_cents`. Returns the resulting line.
  pub fn add(&mut self, product_id: ProductId, quantity: u32, price_at_cents: i64) -> CartItem {
    self.updated_at = Utc::now();
    match self.items.iter_mut().find(|item| item.product_id == product_id) {
      Some(existing) => {
        existing.quantity = existing.quantity.saturating_add(quantity);
        existing.price_at_cents = price_at_cents;
        existing.clone()
      }
      None => {
        let item = CartItem {
          product_id,
          quantity,
          price_at_cents,
        };
        self.items.push(item.clone());
        item
      }
    }
  }

  /// Sets the quantity of an existing line; zero removes it.
  /// Returns false when the product is not in the cart.
  pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
    if quantity == 0 {
      return self.remove(product_id);
    }
    match self.items.iter_mut().find(|item| item.product_id == product_id) {
      Some(existing) => {
        existing.quantity = quantity;
        self.updated_at = Utc::now();
        true
      }
      None => false,
    }
  }

  pub fn remove(&mut self, product_id: ProductId) -> bool {
    let before = self.items.len();
    self.items.retain(|item| item.product_id != product_id);
    let removed = self.items.len() != before;
    if removed {
      self.updated_at = Utc::now();
    }
    removed
  }

  pub fn clear(&mut self) {
    self.items.clear();
    self.updated_at = Utc::now();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_merges_lines_and_refreshes_price() {
    let product = ProductId::new();
    let mut cart = Cart::empty(UserId::new());
    cart.add(product, 1, 2_000);
    let merged = cart.add(product, 2, 1_800);

    assert_eq!(cart.items.len(), 1);
    assert_eq!(merged.quantity, 3);
    assert_eq!(merged.price_at_cents, 1_800);
  }

  #[test]
  fn set_quantity_zero_removes_line() {
    let product = ProductId::new();
    let mut cart = Cart::empty(UserId::new());
    cart.add(product, 4, 500);

    assert!(cart.set_quantity(product, 0));
    assert!(cart.is_empty());
    assert!(!cart.set_quantity(product, 2));
  }
}
