// src/orders/view.rs

//! Orders as returned to callers, with product titles and designer names
//! resolved.

use crate::error::StoreResult;
use crate::ids::{DesignerId, OrderId, ProductId, SlotId, UserId};
use crate::models::{LineItem, Order, OrderStatus, PaymentMethod, ShippingAddress, SlotTime};
use crate::store::UnitOfWork;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineItemView {
  Product {
    product_id: ProductId,
    /// `None` if the product has since been removed.
    title: Option<String>,
    quantity: u32,
    price_cents: i64,
  },
  Consultation {
    designer_id: DesignerId,
    designer_name: Option<String>,
    slot_id: SlotId,
    slot: SlotTime,
    price_cents: i64,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
  pub id: OrderId,
  pub user_id: UserId,
  pub items: Vec<LineItemView>,
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

impl OrderView {
  pub(crate) async fn resolve(uow: &mut dyn UnitOfWork, order: Order) -> StoreResult<Self> {
    let mut titles: HashMap<ProductId, Option<String>> = HashMap::new();
    let mut names: HashMap<DesignerId, Option<String>> = HashMap::new();
    let mut items = Vec::with_capacity(order.items.len());

    for item in order.items {
      let view = match item {
        LineItem::Product {
          product_id,
          quantity,
          price_cents,
        } => {
          let title = match titles.get(&product_id) {
            Some(title) => title.clone(),
            None => {
              let title = uow.product(product_id).await?.map(|p| p.title);
              titles.insert(product_id, title.clone());
              title
            }
          };
          LineItemView::Product {
            product_id,
            title,
            quantity,
            price_cents,
          }
        }
        LineItem::Consultation {
          designer_id,
          slot_id,
          slot,
          price_cents,
        } => {
          let designer_name = match names.get(&designer_id) {
            Some(name) => name.clone(),
            None => {
              let name = uow.designer(designer_id).await?.map(|d| d.name);
              names.insert(designer_id, name.clone());
              name
            }
          };
          LineItemView::Consultation {
            designer_id,
            designer_name,
            slot_id,
            slot,
            price_cents,
          }
        }
      };
      items.push(view);
    }

    Ok(Self {
      id: order.id,
      user_id: order.user_id,
      items,
      shipping_address: order.shipping_address,
      payment_method: order.payment_method,
      subtotal_cents: order.subtotal_cents,
      shipping_cents: order.shipping_cents,
      total_cents: order.total_cents,
      status: order.status,
      notes: order.notes,
      created_at: order.created_at,
      updated_at: order.updated_at,
    })
  }
}
