// src/state.rs
use crate::config::AppConfig;
use decorvista::{
  BroadcastPublisher, CartService, CatalogService, Datastore, FanoutPublisher, MemoryStore, NotificationPublisher,
  OrderService, TracingPublisher, TxRetryPolicy,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub catalog: CatalogService,
  pub carts: CartService,
  pub orders: OrderService,
  /// Real-time transports subscribe here.
  pub notifications: BroadcastPublisher,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(store: Arc<dyn Datastore>, config: Arc<AppConfig>) -> Self {
    let notifications = BroadcastPublisher::new(config.notification_capacity);
    let publisher: Arc<dyn NotificationPublisher> = Arc::new(
      FanoutPublisher::new()
        .with(Arc::new(notifications.clone()))
        .with(Arc::new(TracingPublisher)),
    );
    let retry = TxRetryPolicy {
      max_attempts: config.tx_max_attempts,
      ..TxRetryPolicy::default()
    };
    let orders = OrderService::new(store.clone(), publisher)
      .with_pricing(config.pricing)
      .with_retry(retry);

    Self {
      catalog: CatalogService::new(store.clone()),
      carts: CartService::new(store),
      orders,
      notifications,
      config,
    }
  }

  /// State backed by a fresh `MemoryStore`.
  pub fn in_memory(config: AppConfig) -> Self {
    Self::new(Arc::new(MemoryStore::new()), Arc::new(config))
  }
}
