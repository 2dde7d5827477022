// src/orders/mod.rs

//! Order placement, status changes and order/consultation queries.

mod checkout;
mod query;
mod reserve;
mod status;
mod view;

pub use checkout::{CheckoutRequest, ConsultationRequest, DirectItem};
pub use view::{LineItemView, OrderView};

use crate::notify::NotificationPublisher;
use crate::pricing::PricingPolicy;
use crate::retry::TxRetryPolicy;
use crate::store::Datastore;
use std::sync::Arc;

/// Entry point for everything that creates or mutates orders.
#[derive(Clone)]
pub struct OrderService {
  store: Arc<dyn Datastore>,
  publisher: Arc<dyn NotificationPublisher>,
  pricing: PricingPolicy,
  retry: TxRetryPolicy,
}

impl OrderService {
  pub fn new(store: Arc<dyn Datastore>, publisher: Arc<dyn NotificationPublisher>) -> Self {
    Self {
      store,
      publisher,
      pricing: PricingPolicy::default(),
      retry: TxRetryPolicy::default(),
    }
  }

  pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
    self.pricing = pricing;
    self
  }

  pub fn with_retry(mut self, retry: TxRetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn pricing(&self) -> &PricingPolicy {
    &self.pricing
  }
}
