// src/notify.rs

//! Outbound notifications.
//!
//! The order service receives an `Arc<dyn NotificationPublisher>` and only
//! publishes after its unit of work has committed. Publishing is best-effort:
//! a failing publisher is logged and never changes the outcome of the order.

use crate::ids::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "userId", rename_all = "lowercase")]
pub enum Recipient {
  /// A single account.
  User(UserId),
  /// Every connected administrator.
  Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  /// To the buyer, after checkout.
  OrderPlaced,
  /// To the admin scope, after checkout.
  NewOrder,
  /// To each designer whose slot was booked.
  ConsultationBooked,
  /// To the buyer and the admin scope.
  OrderStatusChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub recipient: Recipient,
  pub kind: NotificationKind,
  pub message: String,
  pub payload: Value,
}

impl Notification {
  pub fn new(recipient: Recipient, kind: NotificationKind, message: impl Into<String>, payload: Value) -> Self {
    Self {
      recipient,
      kind,
      message: message.into(),
      payload,
    }
  }
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
  async fn publish(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Fans notifications out on a `tokio::sync::broadcast` channel. A real-time
/// transport (websocket, SSE) subscribes and filters by recipient.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
  sender: broadcast::Sender<Notification>,
}

impl BroadcastPublisher {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
    self.sender.subscribe()
  }
}

#[async_trait]
impl NotificationPublisher for BroadcastPublisher {
  async fn publish(&self, notification: Notification) -> anyhow::Result<()> {
    // No subscribers is not a failure: nobody is listening right now.
    match self.sender.send(notification) {
      Ok(receivers) => debug!(receivers, "Notification broadcast."),
      Err(broadcast::error::SendError(dropped)) => {
        debug!(kind = ?dropped.kind, "Notification dropped, no subscribers.")
      }
    }
    Ok(())
  }
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

#[async_trait]
impl NotificationPublisher for TracingPublisher {
  async fn publish(&self, notification: Notification) -> anyhow::Result<()> {
    info!(
      recipient = ?notification.recipient,
      kind = ?notification.kind,
      message = %notification.message,
      "Notification"
    );
    Ok(())
  }
}

/// Publishes to every target in order. Keeps going when one fails and reports
/// the last failure.
#[derive(Clone, Default)]
pub struct FanoutPublisher {
  targets: Vec<Arc<dyn NotificationPublisher>>,
}

impl FanoutPublisher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, target: Arc<dyn NotificationPublisher>) -> Self {
    self.targets.push(target);
    self
  }
}

#[async_trait]
impl NotificationPublisher for FanoutPublisher {
  async fn publish(&self, notification: Notification) -> anyhow::Result<()> {
    let mut last_err = None;
    for target in &self.targets {
      if let Err(e) = target.publish(notification.clone()).await {
        last_err = Some(e);
      }
    }
    match last_err {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }
}

/// Publishes each notification, logging and swallowing failures.
pub(crate) async fn dispatch_best_effort(publisher: &dyn NotificationPublisher, notifications: Vec<Notification>) {
  for notification in notifications {
    let kind = notification.kind;
    let recipient = notification.recipient;
    if let Err(e) = publisher.publish(notification).await {
      warn!(?kind, ?recipient, error = %e, "Failed to publish notification; continuing.");
    }
  }
}
