// src/orders/reserve.rs

//! Guarded reservation steps. Each one runs inside the caller's unit of work
//! and turns a guard miss into the specific client error for it.

use crate::error::{CommerceError, CommerceResult};
use crate::ids::{DesignerId, ProductId, UserId};
use crate::models::{AvailabilitySlot, Product, SlotTime};
use crate::store::UnitOfWork;
use tracing::{debug, warn};

/// Takes `quantity` units of the product. On a guard miss the product is read
/// back only to build the error message.
pub(crate) async fn reserve_inventory(
  uow: &mut dyn UnitOfWork,
  product_id: ProductId,
  quantity: u32,
) -> CommerceResult<Product> {
  if let Some(product) = uow.take_inventory(product_id, quantity).await? {
    debug!(%product_id, quantity, remaining = product.inventory, "Inventory reserved.");
    return Ok(product);
  }
  match uow.product(product_id).await? {
    Some(product) => {
      warn!(
        %product_id,
        available = product.inventory,
        requested = quantity,
        "Insufficient inventory, aborting checkout."
      );
      Err(CommerceError::InsufficientInventory {
        product_id,
        title: product.title,
        available: product.inventory,
        requested: quantity,
      })
    }
    None => {
      warn!(%product_id, "Product not found, aborting checkout.");
      Err(CommerceError::ProductNotFound(product_id))
    }
  }
}

/// Books the designer's slot at `time`. Returns the designer's user id (the
/// notification recipient) together with the booked slot.
pub(crate) async fn reserve_slot(
  uow: &mut dyn UnitOfWork,
  designer_id: DesignerId,
  time: &SlotTime,
) -> CommerceResult<(UserId, AvailabilitySlot)> {
  let owner = uow
    .designer_owner(designer_id)
    .await?
    .ok_or(CommerceError::DesignerNotFound(designer_id))?;
  match uow.book_slot(designer_id, time).await? {
    Some(slot) => {
      debug!(%designer_id, slot = %time, "Slot booked.");
      Ok((owner, slot))
    }
    None => {
      warn!(%designer_id, slot = %time, "Slot unavailable, aborting checkout.");
      Err(CommerceError::SlotUnavailable {
        designer_id,
        slot: *time,
      })
    }
  }
}

/// Reverses `reserve_inventory` for a cancelled order line.
pub(crate) async fn restore_inventory(
  uow: &mut dyn UnitOfWork,
  product_id: ProductId,
  quantity: u32,
) -> CommerceResult<()> {
  match uow.return_inventory(product_id, quantity).await? {
    Some(product) => debug!(%product_id, quantity, inventory = product.inventory, "Inventory restored."),
    // The product was removed from the catalog after the order; nothing to credit.
    None => warn!(%product_id, quantity, "Cannot restore inventory for missing product."),
  }
  Ok(())
}
