// src/models/order.rs

use crate::error::{CommerceError, CommerceResult};
use crate::ids::{DesignerId, OrderId, ProductId, SlotId, UserId};
use crate::models::consultation::ConsultationStatus;
use crate::models::designer::SlotTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Status the derived consultation records take when the order moves here.
  pub fn consultation_status(&self) -> ConsultationStatus {
    match self {
      OrderStatus::Pending => ConsultationStatus::Pending,
      OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped => ConsultationStatus::Confirmed,
      OrderStatus::Delivered => ConsultationStatus::Completed,
      OrderStatus::Cancelled => ConsultationStatus::Cancelled,
    }
  }

  /// Whether the buyer may still cancel on their own.
  pub fn cancellable_by_owner(&self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "confirmed" => Ok(OrderStatus::Confirmed),
      "processing" => Ok(OrderStatus::Processing),
      "shipped" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(format!("Unknown order status '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  #[default]
  CashOnDelivery,
  Card,
  BankTransfer,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "cash_on_delivery",
      PaymentMethod::Card => "card",
      PaymentMethod::BankTransfer => "bank_transfer",
    }
  }
}

impl FromStr for PaymentMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
      "card" => Ok(PaymentMethod::Card),
      "bank_transfer" => Ok(PaymentMethod::BankTransfer),
      other => Err(format!("Unknown payment method '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
  pub name: String,
  pub phone: String,
  pub street: String,
  pub city: String,
  pub state: String,
  pub zip: String,
  pub country: String,
}

impl ShippingAddress {
  pub fn validate(&self) -> CommerceResult<()> {
    let fields = [
      ("name", &self.name),
      ("phone", &self.phone),
      ("street", &self.street),
      ("city", &self.city),
      ("state", &self.state),
      ("zip", &self.zip),
      ("country", &self.country),
    ];
    let missing: Vec<&str> = fields
      .iter()
      .filter(|(_, value)| value.trim().is_empty())
      .map(|(field, _)| *field)
      .collect();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(CommerceError::Validation(format!(
        "Shipping address is missing: {}",
        missing.join(", ")
      )))
    }
  }
}

/// One line of an order: a product purchase or a consultation booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineItem {
  Product {
    product_id: ProductId,
    quantity: u32,
    /// Unit price.
    price_cents: i64,
  },
  Consultation {
    designer_id: DesignerId,
    slot_id: SlotId,
    slot: SlotTime,
    price_cents: i64,
  },
}

impl LineItem {
  pub fn line_total_cents(&self) -> Option<i64> {
    match self {
      LineItem::Product {
        quantity, price_cents, ..
      } => price_cents.checked_mul(i64::from(*quantity)),
      LineItem::Consultation { price_cents, .. } => Some(*price_cents),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub user_id: UserId,
  pub items: Vec<LineItem>,
  pub shipping_address: ShippingAddress,
  pub payment_method: PaymentMethod,
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub status: OrderStatus,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// Stores call this before every save.
  pub fn totals_consistent(&self) -> bool {
    self.subtotal_cents.checked_add(self.shipping_cents) == Some(self.total_cents)
  }

  pub fn product_lines(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
    self.items.iter().filter_map(|item| match item {
      LineItem::Product {
        product_id, quantity, ..
      } => Some((*product_id, *quantity)),
      LineItem::Consultation { .. } => None,
    })
  }

  pub fn consultation_lines(&self) -> impl Iterator<Item = (DesignerId, SlotId)> + '_ {
    self.items.iter().filter_map(|item| match item {
      LineItem::Consultation {
        designer_id, slot_id, ..
      } => Some((*designer_id, *slot_id)),
      LineItem::Product { .. } => None,
    })
  }
}
