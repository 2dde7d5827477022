// src/cart.rs

//! Cart maintenance. Each mutation is a read-modify-write of the whole cart,
//! so it reads the cart through `lock_cart` and two requests from the same
//! user apply one after the other.

use crate::error::{CommerceError, CommerceResult};
use crate::ids::{ProductId, UserId};
use crate::models::{Cart, CartItem};
use crate::store::Datastore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct CartService {
  store: Arc<dyn Datastore>,
}

impl CartService {
  pub fn new(store: Arc<dyn Datastore>) -> Self {
    Self { store }
  }

  /// The user's cart, or an empty one if none has been saved yet.
  pub async fn cart(&self, user_id: UserId) -> CommerceResult<Cart> {
    let mut uow = self.store.begin().await?;
    Ok(uow.cart(user_id).await?.unwrap_or_else(|| Cart::empty(user_id)))
  }

  /// Adds `quantity` units at the product's current price.
  ///
  /// Stock is checked against the merged line quantity but not reserved;
  /// reservation happens at checkout.
  #[instrument(name = "cart::add_item", skip(self), err(Display))]
  pub async fn add_item(&self, user_id: UserId, product_id: ProductId, quantity: u32) -> CommerceResult<CartItem> {
    if quantity == 0 {
      return Err(CommerceError::Validation("Quantity must be a positive number.".to_string()));
    }
    let mut uow = self.store.begin().await?;
    let product = uow
      .product(product_id)
      .await?
      .ok_or(CommerceError::ProductNotFound(product_id))?;
    let mut cart = uow.lock_cart(user_id).await?;

    let wanted = cart
      .item(product_id)
      .map_or(0, |item| item.quantity)
      .saturating_add(quantity);
    if wanted > product.inventory {
      warn!(%product_id, available = product.inventory, wanted, "Not enough stock to add to cart.");
      return Err(CommerceError::InsufficientInventory {
        product_id,
        title: product.title,
        available: product.inventory,
        requested: wanted,
      });
    }

    let item = cart.add(product_id, quantity, product.price_cents);
    uow.put_cart(&cart).await?;
    uow.commit().await?;
    info!(%product_id, quantity = item.quantity, "Cart item added.");
    Ok(item)
  }

  /// Sets a line's quantity; zero removes the line.
  #[instrument(name = "cart::update_item", skip(self), err(Display))]
  pub async fn update_item(&self, user_id: UserId, product_id: ProductId, quantity: u32) -> CommerceResult<Cart> {
    let mut uow = self.store.begin().await?;
    let mut cart = uow.lock_cart(user_id).await?;
    if cart.item(product_id).is_none() {
      return Err(CommerceError::Validation(format!("Product {} is not in the cart", product_id)));
    }
    if quantity > 0 {
      let product = uow
        .product(product_id)
        .await?
        .ok_or(CommerceError::ProductNotFound(product_id))?;
      if quantity > product.inventory {
        return Err(CommerceError::InsufficientInventory {
          product_id,
          title: product.title,
          available: product.inventory,
          requested: quantity,
        });
      }
    }
    cart.set_quantity(product_id, quantity);
    uow.put_cart(&cart).await?;
    uow.commit().await?;
    Ok(cart)
  }

  #[instrument(name = "cart::remove_item", skip(self), err(Display))]
  pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> CommerceResult<Cart> {
    let mut uow = self.store.begin().await?;
    let mut cart = uow.lock_cart(user_id).await?;
    if !cart.remove(product_id) {
      return Err(CommerceError::Validation(format!("Product {} is not in the cart", product_id)));
    }
    uow.put_cart(&cart).await?;
    uow.commit().await?;
    Ok(cart)
  }

  pub async fn clear(&self, user_id: UserId) -> CommerceResult<Cart> {
    let mut uow = self.store.begin().await?;
    uow.clear_cart(user_id).await?;
    let cart = uow.cart(user_id).await?.unwrap_or_else(|| Cart::empty(user_id));
    uow.commit().await?;
    Ok(cart)
  }
}
