// src/pricing.rs

//! Shipping and order totals.

use serde::{Deserialize, Serialize};

/// Flat-rate shipping that is waived above a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
  /// Subtotals strictly greater than this ship free.
  pub free_shipping_threshold_cents: i64,
  pub flat_shipping_cents: i64,
}

impl Default for PricingPolicy {
  fn default() -> Self {
    Self {
      free_shipping_threshold_cents: 10_000,
      flat_shipping_cents: 1_000,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
}

impl PricingPolicy {
  pub fn shipping_for(&self, subtotal_cents: i64) -> i64 {
    if subtotal_cents > self.free_shipping_threshold_cents {
      0
    } else {
      self.flat_shipping_cents
    }
  }

  /// `None` on overflow.
  pub fn totals(&self, subtotal_cents: i64) -> Option<Totals> {
    let shipping_cents = self.shipping_for(subtotal_cents);
    Some(Totals {
      subtotal_cents,
      shipping_cents,
      total_cents: subtotal_cents.checked_add(shipping_cents)?,
    })
  }
}
