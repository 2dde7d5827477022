// src/models/consultation.rs

use crate::ids::{ConsultationId, DesignerId, OrderId, SlotId, UserId};
use crate::models::designer::SlotTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
  Pending,
  Confirmed,
  Cancelled,
  Completed,
}

impl ConsultationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ConsultationStatus::Pending => "pending",
      ConsultationStatus::Confirmed => "confirmed",
      ConsultationStatus::Cancelled => "cancelled",
      ConsultationStatus::Completed => "completed",
    }
  }
}

impl FromStr for ConsultationStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(ConsultationStatus::Pending),
      "confirmed" => Ok(ConsultationStatus::Confirmed),
      "cancelled" => Ok(ConsultationStatus::Cancelled),
      "completed" => Ok(ConsultationStatus::Completed),
      other => Err(format!("Unknown consultation status '{}'", other)),
    }
  }
}

/// Standalone view of a consultation booked through an order.
///
/// The order's `LineItem::Consultation` is the source of truth. This record is
/// written in the same unit of work as the order and its status is rewritten
/// whenever the order status changes, so designers can list their bookings
/// without scanning orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
  pub id: ConsultationId,
  pub order_id: OrderId,
  pub homeowner_id: UserId,
  pub designer_id: DesignerId,
  pub slot_id: SlotId,
  pub slot: SlotTime,
  pub price_cents: i64,
  pub status: ConsultationStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
