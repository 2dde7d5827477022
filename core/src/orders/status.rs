// src/orders/status.rs

use super::reserve::restore_inventory;
use super::view::OrderView;
use super::OrderService;
use crate::actor::Actor;
use crate::error::{CommerceError, CommerceResult, StoreError};
use crate::ids::OrderId;
use crate::models::{Order, OrderStatus};
use crate::notify::{dispatch_best_effort, Notification, NotificationKind, Recipient};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

enum StatusChange {
  Applied { previous: OrderStatus, order: Order },
  /// Re-cancelling a cancelled order.
  Unchanged(Order),
}

impl OrderService {
  /// Moves an order to `new_status`.
  ///
  /// Cancelling returns every product line's quantity to inventory and frees
  /// every booked slot, in the same unit of work as the status write. A
  /// cancelled order is terminal: cancelling it again changes nothing and any
  /// other transition is refused.
  ///
  /// Administrators may set any status. The buyer may only cancel, and only
  /// before the order has shipped.
  #[instrument(
    name = "orders::update_status",
    skip(self),
    fields(user_id = %actor.user_id, role = %actor.role),
    err(Display)
  )]
  pub async fn update_status(
    &self,
    actor: Actor,
    order_id: OrderId,
    new_status: OrderStatus,
  ) -> CommerceResult<OrderView> {
    let change = self
      .retry
      .run("update_status", move || self.update_status_once(actor, order_id, new_status))
      .await?;

    let order = match change {
      StatusChange::Unchanged(order) => {
        info!(%order_id, "Order already cancelled; nothing to compensate.");
        order
      }
      StatusChange::Applied { previous, order } => {
        info!(%order_id, from = %previous, to = %order.status, "Order status updated.");
        dispatch_best_effort(self.publisher.as_ref(), status_notifications(&order, previous)).await;
        order
      }
    };
    self.view_of(order).await
  }

  async fn update_status_once(
    &self,
    actor: Actor,
    order_id: OrderId,
    new_status: OrderStatus,
  ) -> CommerceResult<StatusChange> {
    let mut uow = self.store.begin().await?;
    let mut order = uow
      .lock_order(order_id)
      .await?
      .ok_or(CommerceError::OrderNotFound(order_id))?;
    let previous = order.status;

    if !actor.is_admin() {
      if order.user_id != actor.user_id {
        return Err(CommerceError::Forbidden("You can only update your own orders".to_string()));
      }
      if new_status != OrderStatus::Cancelled {
        return Err(CommerceError::Forbidden(
          "Only administrators can set this order status".to_string(),
        ));
      }
      if previous != OrderStatus::Cancelled && !previous.cancellable_by_owner() {
        return Err(CommerceError::InvalidTransition {
          from: previous,
          to: new_status,
        });
      }
    }

    if previous == OrderStatus::Cancelled {
      return if new_status == OrderStatus::Cancelled {
        Ok(StatusChange::Unchanged(order))
      } else {
        Err(CommerceError::InvalidTransition {
          from: previous,
          to: new_status,
        })
      };
    }

    let now = Utc::now();
    // Only the writer that moves the order off `previous` compensates.
    if !uow.set_order_status(order_id, previous, new_status, now).await? {
      return Err(StoreError::Conflict(format!("Order {} changed status concurrently", order_id)).into());
    }

    if new_status == OrderStatus::Cancelled {
      for (product_id, quantity) in order.product_lines() {
        restore_inventory(uow.as_mut(), product_id, quantity).await?;
      }
      for (designer_id, slot_id) in order.consultation_lines() {
        if !uow.release_slot(designer_id, slot_id).await? {
          warn!(%order_id, %designer_id, %slot_id, "Booked slot was not found while cancelling.");
        }
      }
    }

    uow
      .set_consultation_status_for_order(order_id, new_status.consultation_status(), now)
      .await?;
    uow.commit().await?;

    order.status = new_status;
    order.updated_at = now;
    Ok(StatusChange::Applied { previous, order })
  }
}

fn status_notifications(order: &Order, previous: OrderStatus) -> Vec<Notification> {
  let payload = json!({
    "order_id": order.id,
    "previous_status": previous,
    "status": order.status,
  });
  vec![
    Notification::new(
      Recipient::User(order.user_id),
      NotificationKind::OrderStatusChanged,
      format!("Your order {} is now {}.", order.id, order.status),
      payload.clone(),
    ),
    Notification::new(
      Recipient::Admin,
      NotificationKind::OrderStatusChanged,
      format!("Order {} moved from {} to {}.", order.id, previous, order.status),
      payload,
    ),
  ]
}
