// src/error.rs
use crate::ids::{DesignerId, OrderId, ProductId};
use crate::models::{OrderStatus, SlotTime};
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by a `Datastore` / `UnitOfWork` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Serialization failure or deadlock. The whole unit of work may be rerun.
  #[error("Transaction conflict: {0}")]
  Conflict(String),

  /// A stored record violates a model invariant (e.g. total != subtotal + shipping).
  #[error("Integrity violation: {0}")]
  Integrity(String),

  #[error("Datastore failure. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl StoreError {
  pub fn backend(err: impl Into<AnyhowError>) -> Self {
    StoreError::Backend { source: err.into() }
  }

  pub fn is_retryable(&self) -> bool {
    matches!(self, StoreError::Conflict(_))
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CommerceError {
  #[error("Cart is empty and no consultations selected")]
  EmptyCheckout,

  #[error("Insufficient inventory for {title}. Available: {available}, Requested: {requested}")]
  InsufficientInventory {
    product_id: ProductId,
    title: String,
    available: u32,
    requested: u32,
  },

  #[error("Selected time slot is no longer available")]
  SlotUnavailable { designer_id: DesignerId, slot: SlotTime },

  #[error("{0}")]
  Validation(String),

  #[error("Product not found: {0}")]
  ProductNotFound(ProductId),

  #[error("Designer not found: {0}")]
  DesignerNotFound(DesignerId),

  #[error("Order not found: {0}")]
  OrderNotFound(OrderId),

  #[error("{0}")]
  Forbidden(String),

  #[error("Order cannot move from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("Datastore error: {source}")]
  Store {
    #[from]
    source: StoreError,
  },
}

impl CommerceError {
  /// True for failures caused by the request itself, whose message is safe to
  /// show to the caller. Everything else is internal.
  pub fn is_client_error(&self) -> bool {
    !matches!(self, CommerceError::Store { .. })
  }

  pub(crate) fn is_retryable(&self) -> bool {
    matches!(self, CommerceError::Store { source } if source.is_retryable())
  }
}

pub type CommerceResult<T, E = CommerceError> = std::result::Result<T, E>;
