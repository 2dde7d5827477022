// src/orders/checkout.rs

use super::reserve::{reserve_inventory, reserve_slot};
use super::view::OrderView;
use super::OrderService;
use crate::error::{CommerceError, CommerceResult};
use crate::ids::{ConsultationId, DesignerId, OrderId, ProductId, UserId};
use crate::models::{Consultation, LineItem, Order, OrderStatus, PaymentMethod, ShippingAddress, SlotTime};
use crate::notify::{dispatch_best_effort, Notification, NotificationKind, Recipient};
use crate::store::UnitOfWork;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

/// A product line supplied explicitly by the caller instead of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectItem {
  pub product_id: ProductId,
  pub quantity: u32,
  /// Unit price the buyer saw. Falls back to the product's current price.
  #[serde(default)]
  pub price_at_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRequest {
  pub designer_id: DesignerId,
  pub slot: SlotTime,
  pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
  /// Direct buy. When absent or empty the caller's cart is checked out.
  #[serde(default)]
  pub items: Option<Vec<DirectItem>>,
  #[serde(default)]
  pub consultations: Vec<ConsultationRequest>,
  pub shipping_address: ShippingAddress,
  #[serde(default)]
  pub payment_method: PaymentMethod,
  #[serde(default)]
  pub notes: Option<String>,
}

impl CheckoutRequest {
  pub fn from_cart(shipping_address: ShippingAddress) -> Self {
    Self {
      items: None,
      consultations: Vec::new(),
      shipping_address,
      payment_method: PaymentMethod::default(),
      notes: None,
    }
  }

  pub fn direct(items: Vec<DirectItem>, shipping_address: ShippingAddress) -> Self {
    Self {
      items: Some(items),
      ..Self::from_cart(shipping_address)
    }
  }

  pub fn with_consultations(mut self, consultations: Vec<ConsultationRequest>) -> Self {
    self.consultations = consultations;
    self
  }

  fn direct_items(&self) -> Option<&[DirectItem]> {
    self.items.as_deref().filter(|items| !items.is_empty())
  }

  /// Shape checks that do not need the datastore.
  fn validate(&self) -> CommerceResult<()> {
    self.shipping_address.validate()?;
    for item in self.direct_items().unwrap_or_default() {
      if item.quantity == 0 {
        return Err(CommerceError::Validation(format!(
          "Quantity for product {} must be at least 1",
          item.product_id
        )));
      }
      if item.price_at_cents.is_some_and(|price| price < 0) {
        return Err(CommerceError::Validation(format!(
          "Price for product {} cannot be negative",
          item.product_id
        )));
      }
    }
    for consultation in &self.consultations {
      consultation.slot.validate().map_err(CommerceError::Validation)?;
      if consultation.price_cents < 0 {
        return Err(CommerceError::Validation("Consultation price cannot be negative".to_string()));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemSource {
  Direct,
  Cart,
}

struct ProductLine {
  product_id: ProductId,
  quantity: u32,
  price_at_cents: Option<i64>,
}

/// What a committed checkout hands to the notification step.
struct PlacedOrder {
  order: Order,
  /// Designer id to the user account that gets the booking notification.
  designer_users: Vec<(DesignerId, UserId)>,
}

fn overflow() -> CommerceError {
  CommerceError::Validation("Order amount is too large".to_string())
}

async fn resolve_product_lines(
  uow: &mut dyn UnitOfWork,
  user_id: UserId,
  request: &CheckoutRequest,
) -> CommerceResult<(Vec<ProductLine>, ItemSource)> {
  if let Some(items) = request.direct_items() {
    let lines = items
      .iter()
      .map(|item| ProductLine {
        product_id: item.product_id,
        quantity: item.quantity,
        price_at_cents: item.price_at_cents,
      })
      .collect();
    return Ok((lines, ItemSource::Direct));
  }
  // Held until commit: a concurrent checkout of the same cart waits here and
  // then sees the cleared cart.
  let cart = uow.lock_cart(user_id).await?;
  let lines = cart
    .items
    .into_iter()
    .map(|item| ProductLine {
      product_id: item.product_id,
      quantity: item.quantity,
      price_at_cents: Some(item.price_at_cents),
    })
    .collect();
  Ok((lines, ItemSource::Cart))
}

impl OrderService {
  /// Places an order for `user_id`.
  ///
  /// Reserves every product line and consultation slot, prices the order,
  /// writes it and clears the cart (for cart checkouts) in one unit of work.
  /// Any reservation failure rolls everything back and is returned as the
  /// corresponding client error. Notifications are sent after commit.
  #[instrument(
    name = "orders::create_order",
    skip(self, request),
    fields(
      user_id = %user_id,
      direct_items = request.items.as_ref().map_or(0, Vec::len),
      consultations = request.consultations.len()
    ),
    err(Display)
  )]
  pub async fn create_order(&self, user_id: UserId, request: CheckoutRequest) -> CommerceResult<OrderView> {
    request.validate()?;
    let request = &request;
    let placed = self
      .retry
      .run("create_order", move || self.place_order_once(user_id, request))
      .await?;

    info!(
      order_id = %placed.order.id,
      subtotal_cents = placed.order.subtotal_cents,
      shipping_cents = placed.order.shipping_cents,
      total_cents = placed.order.total_cents,
      "Order placed."
    );

    dispatch_best_effort(self.publisher.as_ref(), order_placed_notifications(&placed)).await;
    self.view_of(placed.order).await
  }

  async fn place_order_once(&self, user_id: UserId, request: &CheckoutRequest) -> CommerceResult<PlacedOrder> {
    let mut uow = self.store.begin().await?;

    let (product_lines, source) = resolve_product_lines(uow.as_mut(), user_id, request).await?;
    if product_lines.is_empty() && request.consultations.is_empty() {
      return Err(CommerceError::EmptyCheckout);
    }

    let mut items = Vec::with_capacity(product_lines.len() + request.consultations.len());
    let mut subtotal_cents: i64 = 0;

    for line in &product_lines {
      let product = reserve_inventory(uow.as_mut(), line.product_id, line.quantity).await?;
      let item = LineItem::Product {
        product_id: line.product_id,
        quantity: line.quantity,
        price_cents: line.price_at_cents.unwrap_or(product.price_cents),
      };
      subtotal_cents = item
        .line_total_cents()
        .and_then(|line_total| subtotal_cents.checked_add(line_total))
        .ok_or_else(overflow)?;
      items.push(item);
    }

    let mut designer_users: Vec<(DesignerId, UserId)> = Vec::new();
    for consultation in &request.consultations {
      let designer_id = consultation.designer_id;
      let (designer_user, slot) = reserve_slot(uow.as_mut(), designer_id, &consultation.slot).await?;
      subtotal_cents = subtotal_cents.checked_add(consultation.price_cents).ok_or_else(overflow)?;
      items.push(LineItem::Consultation {
        designer_id,
        slot_id: slot.id,
        slot: slot.time,
        price_cents: consultation.price_cents,
      });
      if !designer_users.iter().any(|(id, _)| *id == designer_id) {
        designer_users.push((designer_id, designer_user));
      }
    }

    let totals = self.pricing.totals(subtotal_cents).ok_or_else(overflow)?;
    let now = Utc::now();
    let order = Order {
      id: OrderId::new(),
      user_id,
      items,
      shipping_address: request.shipping_address.clone(),
      payment_method: request.payment_method,
      subtotal_cents: totals.subtotal_cents,
      shipping_cents: totals.shipping_cents,
      total_cents: totals.total_cents,
      status: OrderStatus::Pending,
      notes: request.notes.clone(),
      created_at: now,
      updated_at: now,
    };
    uow.insert_order(&order).await?;

    for item in &order.items {
      if let LineItem::Consultation {
        designer_id,
        slot_id,
        slot,
        price_cents,
      } = item
      {
        uow
          .insert_consultation(&Consultation {
            id: ConsultationId::new(),
            order_id: order.id,
            homeowner_id: user_id,
            designer_id: *designer_id,
            slot_id: *slot_id,
            slot: *slot,
            price_cents: *price_cents,
            status: OrderStatus::Pending.consultation_status(),
            created_at: now,
            updated_at: now,
          })
          .await?;
      }
    }

    if source == ItemSource::Cart && !product_lines.is_empty() {
      uow.clear_cart(user_id).await?;
    }

    uow.commit().await?;
    Ok(PlacedOrder { order, designer_users })
  }
}

fn order_placed_notifications(placed: &PlacedOrder) -> Vec<Notification> {
  let order = &placed.order;
  let mut notifications = vec![
    Notification::new(
      Recipient::User(order.user_id),
      NotificationKind::OrderPlaced,
      format!("Your order {} has been placed.", order.id),
      json!({ "order_id": order.id, "total_cents": order.total_cents }),
    ),
    Notification::new(
      Recipient::Admin,
      NotificationKind::NewOrder,
      format!("New order {} received.", order.id),
      json!({ "order_id": order.id, "user_id": order.user_id, "total_cents": order.total_cents }),
    ),
  ];
  for item in &order.items {
    if let LineItem::Consultation { designer_id, slot, .. } = item {
      if let Some((_, designer_user)) = placed.designer_users.iter().find(|(id, _)| id == designer_id) {
        notifications.push(Notification::new(
          Recipient::User(*designer_user),
          NotificationKind::ConsultationBooked,
          format!("New consultation booked for {}.", slot),
          json!({ "order_id": order.id, "designer_id": designer_id, "slot": slot }),
        ));
      }
    }
  }
  notifications
}
