// src/store/mod.rs

//! Persistence seam for the commerce core.
//!
//! Every read and write goes through a [`UnitOfWork`] obtained from
//! [`Datastore::begin`]. The unit of work is the transaction boundary:
//! `commit` makes all of its writes visible at once, and dropping it without
//! committing discards them.
//!
//! `Product::inventory` and `AvailabilitySlot::status` are contended between
//! concurrent checkouts. They are only ever changed by the four guarded
//! primitives (`take_inventory`, `return_inventory`, `book_slot`,
//! `release_slot`), each of which must check its guard and apply its change as
//! a single atomic step inside the backend.
//!
//! Read-modify-write paths over a single record (a cart being checked out or
//! edited, an order changing status) read it through the `lock_*` methods.
//! Those hold the record against other writers until the unit of work ends, so
//! a second writer sees the first one's committed result.

pub mod memory;

use crate::error::StoreResult;
use crate::ids::{DesignerId, OrderId, ProductId, SlotId, UserId};
use crate::models::{
  AvailabilitySlot, Cart, Consultation, ConsultationStatus, Designer, Order, OrderStatus, Product, SlotTime,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait Datastore: Send + Sync + 'static {
  /// Opens a new unit of work.
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

#[async_trait]
pub trait UnitOfWork: Send {
  // --- Carts ---

  async fn cart(&mut self, user_id: UserId) -> StoreResult<Option<Cart>>;

  /// Loads the user's cart for writing, creating an empty one if none exists.
  async fn lock_cart(&mut self, user_id: UserId) -> StoreResult<Cart>;

  /// Replaces the user's cart (creating it if needed).
  async fn put_cart(&mut self, cart: &Cart) -> StoreResult<()>;

  /// Empties the user's cart item list. The cart record itself is kept.
  async fn clear_cart(&mut self, user_id: UserId) -> StoreResult<()>;

  // --- Products ---

  async fn product(&mut self, product_id: ProductId) -> StoreResult<Option<Product>>;

  /// One page of products ordered by creation time, plus the total count.
  async fn products(&mut self, offset: u64, limit: u64) -> StoreResult<(Vec<Product>, u64)>;

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;

  /// Decrements inventory by `quantity` if and only if the product exists and
  /// has at least `quantity` units. Returns the updated product, or `None`
  /// when the guard did not match (nothing changed).
  async fn take_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>>;

  /// Increments inventory by `quantity`. `None` when the product is gone.
  async fn return_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>>;

  // --- Designers & availability ---

  async fn designer(&mut self, designer_id: DesignerId) -> StoreResult<Option<Designer>>;

  async fn designers(&mut self) -> StoreResult<Vec<Designer>>;

  /// The user account behind a designer profile, without loading its slots.
  async fn designer_owner(&mut self, designer_id: DesignerId) -> StoreResult<Option<UserId>>;

  async fn insert_designer(&mut self, designer: &Designer) -> StoreResult<()>;

  /// Adds a slot. Returns false if the designer already has a slot with the
  /// same (date, from, to) tuple, or the designer does not exist.
  async fn insert_slot(&mut self, designer_id: DesignerId, slot: &AvailabilitySlot) -> StoreResult<bool>;

  /// Flips the designer's slot at `time` from available to booked, only if it
  /// is currently available. Returns the booked slot, or `None` when the
  /// guard did not match.
  async fn book_slot(&mut self, designer_id: DesignerId, time: &SlotTime) -> StoreResult<Option<AvailabilitySlot>>;

  /// Flips a booked slot back to available. Returns false when the slot is
  /// missing or not booked.
  async fn release_slot(&mut self, designer_id: DesignerId, slot_id: SlotId) -> StoreResult<bool>;

  // --- Orders ---

  /// Implementations must reject an order whose totals are inconsistent.
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

  async fn order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>>;

  /// Like `order`, but holds the order against concurrent status changes.
  async fn lock_order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>>;

  /// Newest first.
  async fn orders_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Order>>;

  /// Moves the order from `from` to `to`. Returns false, changing nothing, when
  /// the order does not exist or its status is no longer `from`.
  async fn set_order_status(
    &mut self,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<bool>;

  // --- Consultations (derived from order lines) ---

  async fn insert_consultation(&mut self, consultation: &Consultation) -> StoreResult<()>;

  /// Rewrites the status of every consultation derived from `order_id`.
  async fn set_consultation_status_for_order(
    &mut self,
    order_id: OrderId,
    status: ConsultationStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<u64>;

  async fn consultations_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Consultation>>;

  async fn consultations_for_designer(&mut self, designer_id: DesignerId) -> StoreResult<Vec<Consultation>>;

  // --- Lifecycle ---

  async fn commit(self: Box<Self>) -> StoreResult<()>;
}
