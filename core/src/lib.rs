// src/lib.rs

//! DecorVista: the transactional write path of a home-decor marketplace.
//!
//! The crate covers:
//!  - Checkout of a cart or a direct-buy item list, optionally combined with
//!    designer consultation bookings, inside a single unit of work.
//!  - Guarded atomic inventory decrements and slot bookings, so concurrent
//!    checkouts can never oversell a product or double-book a slot.
//!  - Order status changes with compensation on cancellation.
//!  - Cart and catalog maintenance that the checkout depends on.
//!
//! Persistence sits behind the [`Datastore`] / [`UnitOfWork`] traits and
//! notifications behind [`NotificationPublisher`]. An in-memory store ships
//! with the crate; the server crate provides the PostgreSQL one.

pub mod actor;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod models;
pub mod notify;
pub mod orders;
pub mod pricing;
pub mod retry;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::actor::{Actor, Role};
pub use crate::cart::CartService;
pub use crate::catalog::{CatalogService, Page};
pub use crate::error::{CommerceError, CommerceResult, StoreError, StoreResult};
pub use crate::ids::{ConsultationId, DesignerId, OrderId, ProductId, SlotId, UserId};
pub use crate::models::{
  AvailabilitySlot, Cart, CartItem, Consultation, ConsultationStatus, Designer, LineItem, Order, OrderStatus,
  PaymentMethod, Product, ShippingAddress, SlotStatus, SlotTime, TimeOfDay,
};
pub use crate::notify::{
  BroadcastPublisher, FanoutPublisher, Notification, NotificationKind, NotificationPublisher, Recipient,
  TracingPublisher,
};
pub use crate::orders::{
  CheckoutRequest, ConsultationRequest, DirectItem, LineItemView, OrderService, OrderView,
};
pub use crate::pricing::{PricingPolicy, Totals};
pub use crate::retry::TxRetryPolicy;
pub use crate::store::memory::MemoryStore;
pub use crate::store::{Datastore, UnitOfWork};

/*
    Checkout flow:
    1. Validate the request shape (address, quantities, prices, slot times).
    2. `Datastore::begin()` opens a unit of work.
    3. Resolve the item source: direct-buy list, else the caller's cart.
    4. `take_inventory` per product line, `book_slot` per consultation.
       The first guard that fails drops the unit of work, rolling back.
    5. Price the order, insert it with its derived consultation records,
       clear the cart if it was the source.
    6. Commit, then publish notifications best-effort.
*/
