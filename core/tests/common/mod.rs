// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fixture.

use async_trait::async_trait;
use chrono::NaiveDate;
use decorvista::{
  Actor, AvailabilitySlot, CartService, CatalogService, Designer, MemoryStore, Notification, NotificationKind,
  NotificationPublisher, OrderService, Product, Recipient, ShippingAddress, SlotTime, UserId,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;

// --- Publishers ---

/// Keeps every published notification for later assertions.
#[derive(Default)]
pub struct RecordingPublisher {
  sent: Mutex<Vec<Notification>>,
}

impl RecordingPublisher {
  pub fn sent(&self) -> Vec<Notification> {
    self.sent.lock().clone()
  }

  pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
    self.sent.lock().iter().filter(|n| n.kind == kind).cloned().collect()
  }

  pub fn to(&self, recipient: Recipient) -> Vec<Notification> {
    self.sent.lock().iter().filter(|n| n.recipient == recipient).cloned().collect()
  }

  pub fn clear(&self) {
    self.sent.lock().clear();
  }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
  async fn publish(&self, notification: Notification) -> anyhow::Result<()> {
    self.sent.lock().push(notification);
    Ok(())
  }
}

/// Fails every publish, like a transport that is down.
pub struct FailingPublisher;

#[async_trait]
impl NotificationPublisher for FailingPublisher {
  async fn publish(&self, _notification: Notification) -> anyhow::Result<()> {
    anyhow::bail!("notification transport unavailable")
  }
}

// --- Fixture ---

pub struct Shop {
  pub store: Arc<MemoryStore>,
  pub publisher: Arc<RecordingPublisher>,
  pub catalog: CatalogService,
  pub carts: CartService,
  pub orders: OrderService,
  pub admin: Actor,
}

impl Shop {
  pub fn new() -> Self {
    let store = Arc::new(MemoryStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    Self {
      catalog: CatalogService::new(store.clone()),
      carts: CartService::new(store.clone()),
      orders: OrderService::new(store.clone(), publisher.clone()),
      store,
      publisher,
      admin: Actor::admin(UserId::new()),
    }
  }

  /// Same store, but notifications go to a publisher that always fails.
  pub fn with_failing_notifications(&self) -> OrderService {
    OrderService::new(self.store.clone(), Arc::new(FailingPublisher))
  }

  pub async fn product(&self, title: &str, price_cents: i64, inventory: u32) -> Product {
    self
      .catalog
      .create_product(self.admin, title.to_string(), price_cents, inventory)
      .await
      .expect("create product")
  }

  pub async fn inventory(&self, product: &Product) -> u32 {
    self.catalog.product(product.id).await.expect("load product").inventory
  }

  /// A designer with one available slot at `time`.
  pub async fn designer_with_slot(&self, name: &str, time: SlotTime) -> (Designer, AvailabilitySlot) {
    let designer = self
      .catalog
      .create_designer(self.admin, UserId::new(), name.to_string())
      .await
      .expect("create designer");
    let slot = self
      .catalog
      .add_slot(self.admin, designer.id, time)
      .await
      .expect("add slot");
    (designer, slot)
  }

  pub async fn slot_state(&self, designer: &Designer, time: SlotTime) -> AvailabilitySlot {
    self
      .catalog
      .designer(designer.id)
      .await
      .expect("load designer")
      .slot_at(&time)
      .cloned()
      .expect("slot exists")
  }
}

pub fn address() -> ShippingAddress {
  ShippingAddress {
    name: "Ana Ruiz".to_string(),
    phone: "+1 555 0100".to_string(),
    street: "12 Elm Street".to_string(),
    city: "Portland".to_string(),
    state: "OR".to_string(),
    zip: "97201".to_string(),
    country: "US".to_string(),
  }
}

pub fn slot(date: &str, from: &str, to: &str) -> SlotTime {
  SlotTime::new(
    NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
    from.parse().expect("from"),
    to.parse().expect("to"),
  )
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
