// src/orders/query.rs

use super::view::OrderView;
use super::OrderService;
use crate::actor::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::ids::{DesignerId, OrderId, UserId};
use crate::models::{Consultation, Order};
use tracing::instrument;

impl OrderService {
  pub(crate) async fn view_of(&self, order: Order) -> CommerceResult<OrderView> {
    let mut uow = self.store.begin().await?;
    Ok(OrderView::resolve(uow.as_mut(), order).await?)
  }

  /// Visible to the buyer and to administrators.
  #[instrument(name = "orders::order", skip(self), fields(user_id = %actor.user_id), err(Display))]
  pub async fn order(&self, actor: Actor, order_id: OrderId) -> CommerceResult<OrderView> {
    let mut uow = self.store.begin().await?;
    let order = uow.order(order_id).await?.ok_or(CommerceError::OrderNotFound(order_id))?;
    if order.user_id != actor.user_id && !actor.is_admin() {
      return Err(CommerceError::Forbidden("You can only view your own orders".to_string()));
    }
    Ok(OrderView::resolve(uow.as_mut(), order).await?)
  }

  /// The user's orders, newest first.
  #[instrument(name = "orders::orders_for", skip(self), err(Display))]
  pub async fn orders_for(&self, user_id: UserId) -> CommerceResult<Vec<OrderView>> {
    let mut uow = self.store.begin().await?;
    let orders = uow.orders_for_user(user_id).await?;
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
      views.push(OrderView::resolve(uow.as_mut(), order).await?);
    }
    Ok(views)
  }

  pub async fn consultations_for_user(&self, user_id: UserId) -> CommerceResult<Vec<Consultation>> {
    let mut uow = self.store.begin().await?;
    Ok(uow.consultations_for_user(user_id).await?)
  }

  /// Bookings for one designer, by slot time. Admins and the designer's own
  /// account only.
  #[instrument(name = "orders::consultations_for_designer", skip(self), fields(user_id = %actor.user_id), err(Display))]
  pub async fn consultations_for_designer(
    &self,
    actor: Actor,
    designer_id: DesignerId,
  ) -> CommerceResult<Vec<Consultation>> {
    let mut uow = self.store.begin().await?;
    let designer = uow
      .designer(designer_id)
      .await?
      .ok_or(CommerceError::DesignerNotFound(designer_id))?;
    if designer.user_id != actor.user_id && !actor.is_admin() {
      return Err(CommerceError::Forbidden(
        "Only the designer or an administrator can list these consultations".to_string(),
      ));
    }
    Ok(uow.consultations_for_designer(designer_id).await?)
  }
}
