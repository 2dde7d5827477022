// src/catalog.rs

//! Products, designers and designer availability.

use crate::actor::Actor;
use crate::error::{CommerceError, CommerceResult};
use crate::ids::{DesignerId, ProductId, UserId};
use crate::models::{AvailabilitySlot, Designer, Product, SlotStatus, SlotTime};
use crate::store::Datastore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// 1-based.
  pub page: u32,
  pub per_page: u32,
  pub total: u64,
}

impl<T> Page<T> {
  pub fn total_pages(&self) -> u64 {
    self.total.div_ceil(u64::from(self.per_page.max(1)))
  }
}

#[derive(Clone)]
pub struct CatalogService {
  store: Arc<dyn Datastore>,
}

impl CatalogService {
  pub fn new(store: Arc<dyn Datastore>) -> Self {
    Self { store }
  }

  #[instrument(name = "catalog::create_product", skip(self, title), fields(user_id = %actor.user_id), err(Display))]
  pub async fn create_product(
    &self,
    actor: Actor,
    title: String,
    price_cents: i64,
    inventory: u32,
  ) -> CommerceResult<Product> {
    actor.require_admin("create products")?;
    if title.trim().is_empty() {
      return Err(CommerceError::Validation("Product title is required".to_string()));
    }
    if price_cents < 0 {
      return Err(CommerceError::Validation("Product price cannot be negative".to_string()));
    }
    let product = Product::new(title.trim(), price_cents, inventory);
    let mut uow = self.store.begin().await?;
    uow.insert_product(&product).await?;
    uow.commit().await?;
    info!(product_id = %product.id, "Product created.");
    Ok(product)
  }

  pub async fn product(&self, product_id: ProductId) -> CommerceResult<Product> {
    let mut uow = self.store.begin().await?;
    uow
      .product(product_id)
      .await?
      .ok_or(CommerceError::ProductNotFound(product_id))
  }

  /// `page` is 1-based; `per_page` is clamped to `1..=MAX_PER_PAGE`.
  pub async fn list_products(&self, page: Option<u32>, per_page: Option<u32>) -> CommerceResult<Page<Product>> {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let offset = u64::from(page - 1) * u64::from(per_page);
    let mut uow = self.store.begin().await?;
    let (items, total) = uow.products(offset, u64::from(per_page)).await?;
    Ok(Page {
      items,
      page,
      per_page,
      total,
    })
  }

  /// Adds stock through the same guarded increment that cancellations use.
  #[instrument(name = "catalog::restock", skip(self), fields(user_id = %actor.user_id), err(Display))]
  pub async fn restock(&self, actor: Actor, product_id: ProductId, quantity: u32) -> CommerceResult<Product> {
    actor.require_admin("restock products")?;
    if quantity == 0 {
      return Err(CommerceError::Validation("Restock quantity must be at least 1".to_string()));
    }
    let mut uow = self.store.begin().await?;
    let product = uow
      .return_inventory(product_id, quantity)
      .await?
      .ok_or(CommerceError::ProductNotFound(product_id))?;
    uow.commit().await?;
    info!(%product_id, inventory = product.inventory, "Product restocked.");
    Ok(product)
  }

  #[instrument(name = "catalog::create_designer", skip(self, name), fields(actor_id = %actor.user_id), err(Display))]
  pub async fn create_designer(&self, actor: Actor, user_id: UserId, name: String) -> CommerceResult<Designer> {
    actor.require_admin("create designer profiles")?;
    if name.trim().is_empty() {
      return Err(CommerceError::Validation("Designer name is required".to_string()));
    }
    let designer = Designer::new(user_id, name.trim());
    let mut uow = self.store.begin().await?;
    uow.insert_designer(&designer).await?;
    uow.commit().await?;
    info!(designer_id = %designer.id, "Designer created.");
    Ok(designer)
  }

  pub async fn designer(&self, designer_id: DesignerId) -> CommerceResult<Designer> {
    let mut uow = self.store.begin().await?;
    uow
      .designer(designer_id)
      .await?
      .ok_or(CommerceError::DesignerNotFound(designer_id))
  }

  pub async fn designers(&self) -> CommerceResult<Vec<Designer>> {
    let mut uow = self.store.begin().await?;
    Ok(uow.designers().await?)
  }

  /// Opens a new available slot. Admins or the designer's own account only.
  #[instrument(name = "catalog::add_slot", skip(self), fields(user_id = %actor.user_id), err(Display))]
  pub async fn add_slot(
    &self,
    actor: Actor,
    designer_id: DesignerId,
    time: SlotTime,
  ) -> CommerceResult<AvailabilitySlot> {
    time.validate().map_err(CommerceError::Validation)?;
    let mut uow = self.store.begin().await?;
    let designer = uow
      .designer(designer_id)
      .await?
      .ok_or(CommerceError::DesignerNotFound(designer_id))?;
    if designer.user_id != actor.user_id && !actor.is_admin() {
      return Err(CommerceError::Forbidden(
        "Only the designer or an administrator can manage availability".to_string(),
      ));
    }
    let slot = AvailabilitySlot::available(time);
    if !uow.insert_slot(designer_id, &slot).await? {
      return Err(CommerceError::Validation(format!("A slot already exists at {}", time)));
    }
    uow.commit().await?;
    info!(%designer_id, slot_id = %slot.id, slot = %time, "Availability slot added.");
    Ok(slot)
  }

  pub async fn available_slots(&self, designer_id: DesignerId) -> CommerceResult<Vec<AvailabilitySlot>> {
    let designer = self.designer(designer_id).await?;
    Ok(
      designer
        .slots
        .into_iter()
        .filter(|slot| slot.status == SlotStatus::Available)
        .collect(),
    )
  }
}
