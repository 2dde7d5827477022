// src/store/memory.rs

//! In-process `Datastore`.
//!
//! A unit of work holds the table mutex for its whole lifetime and works on a
//! staged copy of the tables. `commit` swaps the copy in; dropping the unit of
//! work throws it away. Transactions are therefore fully serialized, which
//! gives the same all-or-nothing and guard-at-commit guarantees a real backend
//! provides, at the cost of throughput.

use crate::error::{StoreError, StoreResult};
use crate::ids::{ConsultationId, DesignerId, OrderId, ProductId, SlotId, UserId};
use crate::models::{
  AvailabilitySlot, Cart, Consultation, ConsultationStatus, Designer, Order, OrderStatus, Product, SlotStatus,
  SlotTime,
};
use crate::store::{Datastore, UnitOfWork};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Default)]
struct Tables {
  products: HashMap<ProductId, Product>,
  designers: HashMap<DesignerId, Designer>,
  carts: HashMap<UserId, Cart>,
  orders: HashMap<OrderId, Order>,
  consultations: HashMap<ConsultationId, Consultation>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Datastore for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let staged = guard.clone();
    trace!("Memory unit of work opened.");
    Ok(Box::new(MemoryUnitOfWork { guard, staged }))
  }
}

struct MemoryUnitOfWork {
  guard: OwnedMutexGuard<Tables>,
  staged: Tables,
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
  items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
  async fn cart(&mut self, user_id: UserId) -> StoreResult<Option<Cart>> {
    Ok(self.staged.carts.get(&user_id).cloned())
  }

  async fn lock_cart(&mut self, user_id: UserId) -> StoreResult<Cart> {
    Ok(
      self
        .staged
        .carts
        .entry(user_id)
        .or_insert_with(|| Cart::empty(user_id))
        .clone(),
    )
  }

  async fn put_cart(&mut self, cart: &Cart) -> StoreResult<()> {
    self.staged.carts.insert(cart.user_id, cart.clone());
    Ok(())
  }

  async fn clear_cart(&mut self, user_id: UserId) -> StoreResult<()> {
    if let Some(cart) = self.staged.carts.get_mut(&user_id) {
      cart.clear();
    }
    Ok(())
  }

  async fn product(&mut self, product_id: ProductId) -> StoreResult<Option<Product>> {
    Ok(self.staged.products.get(&product_id).cloned())
  }

  async fn products(&mut self, offset: u64, limit: u64) -> StoreResult<(Vec<Product>, u64)> {
    let mut all: Vec<Product> = self.staged.products.values().cloned().collect();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let total = all.len() as u64;
    let page = all
      .into_iter()
      .skip(usize::try_from(offset).unwrap_or(usize::MAX))
      .take(usize::try_from(limit).unwrap_or(usize::MAX))
      .collect();
    Ok((page, total))
  }

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    if self.staged.products.contains_key(&product.id) {
      return Err(StoreError::Integrity(format!("Product {} already exists", product.id)));
    }
    self.staged.products.insert(product.id, product.clone());
    Ok(())
  }

  async fn take_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>> {
    match self.staged.products.get_mut(&product_id) {
      Some(product) if product.inventory >= quantity => {
        product.inventory -= quantity;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn return_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>> {
    match self.staged.products.get_mut(&product_id) {
      Some(product) => {
        product.inventory = product
          .inventory
          .checked_add(quantity)
          .ok_or_else(|| StoreError::Integrity(format!("Inventory overflow for product {}", product_id)))?;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
      }
      None => Ok(None),
    }
  }

  async fn designer(&mut self, designer_id: DesignerId) -> StoreResult<Option<Designer>> {
    Ok(self.staged.designers.get(&designer_id).cloned())
  }

  async fn designers(&mut self) -> StoreResult<Vec<Designer>> {
    let mut all: Vec<Designer> = self.staged.designers.values().cloned().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(all)
  }

  async fn designer_owner(&mut self, designer_id: DesignerId) -> StoreResult<Option<UserId>> {
    Ok(self.staged.designers.get(&designer_id).map(|designer| designer.user_id))
  }

  async fn insert_designer(&mut self, designer: &Designer) -> StoreResult<()> {
    if self.staged.designers.contains_key(&designer.id) {
      return Err(StoreError::Integrity(format!("Designer {} already exists", designer.id)));
    }
    self.staged.designers.insert(designer.id, designer.clone());
    Ok(())
  }

  async fn insert_slot(&mut self, designer_id: DesignerId, slot: &AvailabilitySlot) -> StoreResult<bool> {
    let Some(designer) = self.staged.designers.get_mut(&designer_id) else {
      return Ok(false);
    };
    if designer.slot_at(&slot.time).is_some() {
      return Ok(false);
    }
    designer.slots.push(slot.clone());
    designer.slots.sort_by(|a, b| (a.time.date, a.time.from).cmp(&(b.time.date, b.time.from)));
    Ok(true)
  }

  async fn book_slot(&mut self, designer_id: DesignerId, time: &SlotTime) -> StoreResult<Option<AvailabilitySlot>> {
    let slot = self
      .staged
      .designers
      .get_mut(&designer_id)
      .and_then(|designer| designer.slots.iter_mut().find(|slot| slot.time == *time));
    match slot {
      Some(slot) if slot.status == SlotStatus::Available => {
        slot.status = SlotStatus::Booked;
        Ok(Some(slot.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn release_slot(&mut self, designer_id: DesignerId, slot_id: SlotId) -> StoreResult<bool> {
    let slot = self
      .staged
      .designers
      .get_mut(&designer_id)
      .and_then(|designer| designer.slots.iter_mut().find(|slot| slot.id == slot_id));
    match slot {
      Some(slot) if slot.status == SlotStatus::Booked => {
        slot.status = SlotStatus::Available;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    if !order.totals_consistent() {
      return Err(StoreError::Integrity(format!(
        "Order {} total {} != subtotal {} + shipping {}",
        order.id, order.total_cents, order.subtotal_cents, order.shipping_cents
      )));
    }
    if self.staged.orders.contains_key(&order.id) {
      return Err(StoreError::Integrity(format!("Order {} already exists", order.id)));
    }
    self.staged.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>> {
    Ok(self.staged.orders.get(&order_id).cloned())
  }

  async fn lock_order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>> {
    self.order(order_id).await
  }

  async fn orders_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .staged
      .orders
      .values()
      .filter(|order| order.user_id == user_id)
      .cloned()
      .collect();
    newest_first(&mut orders, |order| order.created_at);
    Ok(orders)
  }

  async fn set_order_status(
    &mut self,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<bool> {
    match self.staged.orders.get_mut(&order_id) {
      Some(order) if order.status == from => {
        order.status = to;
        order.updated_at = updated_at;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn insert_consultation(&mut self, consultation: &Consultation) -> StoreResult<()> {
    self.staged.consultations.insert(consultation.id, consultation.clone());
    Ok(())
  }

  async fn set_consultation_status_for_order(
    &mut self,
    order_id: OrderId,
    status: ConsultationStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<u64> {
    let mut touched = 0;
    for consultation in self.staged.consultations.values_mut().filter(|c| c.order_id == order_id) {
      consultation.status = status;
      consultation.updated_at = updated_at;
      touched += 1;
    }
    Ok(touched)
  }

  async fn consultations_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Consultation>> {
    let mut found: Vec<Consultation> = self
      .staged
      .consultations
      .values()
      .filter(|c| c.homeowner_id == user_id)
      .cloned()
      .collect();
    newest_first(&mut found, |c| c.created_at);
    Ok(found)
  }

  async fn consultations_for_designer(&mut self, designer_id: DesignerId) -> StoreResult<Vec<Consultation>> {
    let mut found: Vec<Consultation> = self
      .staged
      .consultations
      .values()
      .filter(|c| c.designer_id == designer_id)
      .cloned()
      .collect();
    found.sort_by(|a, b| (a.slot.date, a.slot.from).cmp(&(b.slot.date, b.slot.from)));
    Ok(found)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryUnitOfWork { mut guard, staged } = *self;
    *guard = staged;
    trace!("Memory unit of work committed.");
    Ok(())
  }
}
