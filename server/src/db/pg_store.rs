// src/db/pg_store.rs

//! PostgreSQL `Datastore`.
//!
//! A unit of work is one database transaction. The guarded primitives are
//! single conditional `UPDATE ... WHERE <guard> RETURNING` statements, so the
//! check and the write happen under the same row lock and a concurrent
//! checkout re-evaluates the guard against the committed row.
//!
//! `lock_cart` and `lock_order` read with `FOR UPDATE`. Under READ COMMITTED a
//! second transaction blocks on the row lock and, once the first commits,
//! reads the committed version.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use decorvista::{
  AvailabilitySlot, Cart, CartItem, Consultation, ConsultationStatus, Datastore, Designer, DesignerId, LineItem,
  Order, OrderId, OrderStatus, Product, ProductId, ShippingAddress, SlotId, SlotTime, StoreError, StoreResult,
  UnitOfWork, UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, trace};
use uuid::Uuid;

/// Serialization failures and deadlocks are retryable; constraint and range
/// violations are integrity errors; everything else is opaque.
fn map_sqlx(err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    match db_err.code().as_deref() {
      Some("40001") | Some("40P01") => return StoreError::Conflict(db_err.message().to_string()),
      Some("23505") | Some("23503") | Some("23514") | Some("22003") => {
        return StoreError::Integrity(db_err.message().to_string())
      }
      _ => {}
    }
  }
  StoreError::backend(err)
}

fn parse_column<T>(column: &str, raw: &str) -> StoreResult<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .parse()
    .map_err(|e| StoreError::Integrity(format!("Bad {} value '{}': {}", column, raw, e)))
}

fn to_u32(column: &str, value: i32) -> StoreResult<u32> {
  u32::try_from(value).map_err(|_| StoreError::Integrity(format!("Negative {}: {}", column, value)))
}

// --- Row types ---

#[derive(FromRow)]
struct ProductRow {
  id: Uuid,
  title: String,
  price_cents: i64,
  inventory: i32,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
  type Error = StoreError;

  fn try_from(row: ProductRow) -> StoreResult<Self> {
    Ok(Product {
      id: ProductId(row.id),
      title: row.title,
      price_cents: row.price_cents,
      inventory: to_u32("inventory", row.inventory)?,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(FromRow)]
struct DesignerRow {
  id: Uuid,
  user_id: Uuid,
  name: String,
  created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SlotRow {
  id: Uuid,
  designer_id: Uuid,
  slot_date: NaiveDate,
  start_time: String,
  end_time: String,
  status: String,
}

impl TryFrom<SlotRow> for AvailabilitySlot {
  type Error = StoreError;

  fn try_from(row: SlotRow) -> StoreResult<Self> {
    Ok(AvailabilitySlot {
      id: SlotId(row.id),
      time: SlotTime::new(
        row.slot_date,
        parse_column("start_time", &row.start_time)?,
        parse_column("end_time", &row.end_time)?,
      ),
      status: parse_column("status", &row.status)?,
    })
  }
}

#[derive(FromRow)]
struct CartRow {
  user_id: Uuid,
  items: Json<Vec<CartItem>>,
  updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: Uuid,
  items: Json<Vec<LineItem>>,
  shipping_address: Json<ShippingAddress>,
  payment_method: String,
  subtotal_cents: i64,
  shipping_cents: i64,
  total_cents: i64,
  status: String,
  notes: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> StoreResult<Self> {
    Ok(Order {
      id: OrderId(row.id),
      user_id: UserId(row.user_id),
      items: row.items.0,
      shipping_address: row.shipping_address.0,
      payment_method: parse_column("payment_method", &row.payment_method)?,
      subtotal_cents: row.subtotal_cents,
      shipping_cents: row.shipping_cents,
      total_cents: row.total_cents,
      status: parse_column("status", &row.status)?,
      notes: row.notes,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(FromRow)]
struct ConsultationRow {
  id: Uuid,
  order_id: Uuid,
  homeowner_id: Uuid,
  designer_id: Uuid,
  slot_id: Uuid,
  slot_date: NaiveDate,
  start_time: String,
  end_time: String,
  price_cents: i64,
  status: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ConsultationRow> for Consultation {
  type Error = StoreError;

  fn try_from(row: ConsultationRow) -> StoreResult<Self> {
    Ok(Consultation {
      id: row.id.into(),
      order_id: OrderId(row.order_id),
      homeowner_id: UserId(row.homeowner_id),
      designer_id: DesignerId(row.designer_id),
      slot_id: SlotId(row.slot_id),
      slot: SlotTime::new(
        row.slot_date,
        parse_column("start_time", &row.start_time)?,
        parse_column("end_time", &row.end_time)?,
      ),
      price_cents: row.price_cents,
      status: parse_column("status", &row.status)?,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
  T: TryFrom<R, Error = StoreError>,
{
  rows.into_iter().map(T::try_from).collect()
}

const PRODUCT_COLUMNS: &str = "id, title, price_cents, inventory, created_at, updated_at";
const SLOT_COLUMNS: &str = "id, designer_id, slot_date, start_time, end_time, status";
const ORDER_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, subtotal_cents, shipping_cents, \
                             total_cents, status, notes, created_at, updated_at";
const CONSULTATION_COLUMNS: &str = "id, order_id, homeowner_id, designer_id, slot_id, slot_date, start_time, \
                                    end_time, price_cents, status, created_at, updated_at";

// --- Store ---

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!(max_connections, "Connected to PostgreSQL.");
    Ok(Self::new(pool))
  }

  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl Datastore for PgStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let tx = self.pool.begin().await.map_err(map_sqlx)?;
    trace!("PostgreSQL transaction opened.");
    Ok(Box::new(PgUnitOfWork { tx }))
  }
}

/// Dropping this without `commit` rolls the transaction back.
struct PgUnitOfWork {
  tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
  async fn slots_for(&mut self, designer_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<AvailabilitySlot>>> {
    let rows: Vec<SlotRow> = sqlx::query_as(&format!(
      "SELECT {SLOT_COLUMNS} FROM availability_slots WHERE designer_id = ANY($1) ORDER BY slot_date, start_time"
    ))
    .bind(designer_ids)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;

    let mut by_designer: HashMap<Uuid, Vec<AvailabilitySlot>> = HashMap::new();
    for row in rows {
      let designer_id = row.designer_id;
      by_designer
        .entry(designer_id)
        .or_default()
        .push(AvailabilitySlot::try_from(row)?);
    }
    Ok(by_designer)
  }

  async fn consultations_where(&mut self, filter: &str, id: Uuid, order_by: &str) -> StoreResult<Vec<Consultation>> {
    let rows: Vec<ConsultationRow> = sqlx::query_as(&format!(
      "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE {filter} = $1 ORDER BY {order_by}"
    ))
    .bind(id)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    collect(rows)
  }
}

fn cart_from(row: CartRow) -> Cart {
  Cart {
    user_id: UserId(row.user_id),
    items: row.items.0,
    updated_at: row.updated_at,
  }
}

fn designer_from(row: DesignerRow, slots: Vec<AvailabilitySlot>) -> Designer {
  Designer {
    id: DesignerId(row.id),
    user_id: UserId(row.user_id),
    name: row.name,
    slots,
    created_at: row.created_at,
  }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
  async fn cart(&mut self, user_id: UserId) -> StoreResult<Option<Cart>> {
    let row: Option<CartRow> = sqlx::query_as("SELECT user_id, items, updated_at FROM carts WHERE user_id = $1")
      .bind(user_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok(row.map(cart_from))
  }

  async fn lock_cart(&mut self, user_id: UserId) -> StoreResult<Cart> {
    sqlx::query(
      "INSERT INTO carts (user_id, items, updated_at) VALUES ($1, '[]'::jsonb, NOW()) \
       ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id.0)
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    let row: CartRow = sqlx::query_as("SELECT user_id, items, updated_at FROM carts WHERE user_id = $1 FOR UPDATE")
      .bind(user_id.0)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok(cart_from(row))
  }

  async fn put_cart(&mut self, cart: &Cart) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO carts (user_id, items, updated_at) VALUES ($1, $2, $3) \
       ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at",
    )
    .bind(cart.user_id.0)
    .bind(Json(&cart.items))
    .bind(cart.updated_at)
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
  }

  async fn clear_cart(&mut self, user_id: UserId) -> StoreResult<()> {
    sqlx::query("UPDATE carts SET items = '[]'::jsonb, updated_at = NOW() WHERE user_id = $1")
      .bind(user_id.0)
      .execute(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok(())
  }

  async fn product(&mut self, product_id: ProductId) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
      .bind(product_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    row.map(Product::try_from).transpose()
  }

  async fn products(&mut self, offset: u64, limit: u64) -> StoreResult<(Vec<Product>, u64)> {
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows: Vec<ProductRow> = sqlx::query_as(&format!(
      "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id OFFSET $1 LIMIT $2"
    ))
    .bind(offset)
    .bind(limit)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
      .fetch_one(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok((collect(rows)?, u64::try_from(total).unwrap_or(0)))
  }

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    let inventory = i32::try_from(product.inventory)
      .map_err(|_| StoreError::Integrity(format!("Inventory too large: {}", product.inventory)))?;
    sqlx::query(&format!("INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"))
      .bind(product.id.0)
      .bind(&product.title)
      .bind(product.price_cents)
      .bind(inventory)
      .bind(product.created_at)
      .bind(product.updated_at)
      .execute(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok(())
  }

  async fn take_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
      "UPDATE products SET inventory = inventory - $2, updated_at = NOW() \
       WHERE id = $1 AND inventory >= $2 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(product_id.0)
    .bind(i64::from(quantity))
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    row.map(Product::try_from).transpose()
  }

  async fn return_inventory(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Option<Product>> {
    let row: Option<ProductRow> = sqlx::query_as(&format!(
      "UPDATE products SET inventory = inventory + $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(product_id.0)
    .bind(i64::from(quantity))
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    row.map(Product::try_from).transpose()
  }

  async fn designer(&mut self, designer_id: DesignerId) -> StoreResult<Option<Designer>> {
    let row: Option<DesignerRow> = sqlx::query_as("SELECT id, user_id, name, created_at FROM designers WHERE id = $1")
      .bind(designer_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    let Some(row) = row else {
      return Ok(None);
    };
    let mut slots = self.slots_for(&[row.id]).await?;
    let slots = slots.remove(&row.id).unwrap_or_default();
    Ok(Some(designer_from(row, slots)))
  }

  async fn designers(&mut self) -> StoreResult<Vec<Designer>> {
    let rows: Vec<DesignerRow> = sqlx::query_as("SELECT id, user_id, name, created_at FROM designers ORDER BY name, id")
      .fetch_all(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut slots = self.slots_for(&ids).await?;
    Ok(
      rows
        .into_iter()
        .map(|row| {
          let own = slots.remove(&row.id).unwrap_or_default();
          designer_from(row, own)
        })
        .collect(),
    )
  }

  async fn designer_owner(&mut self, designer_id: DesignerId) -> StoreResult<Option<UserId>> {
    let user_id: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM designers WHERE id = $1")
      .bind(designer_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    Ok(user_id.map(UserId))
  }

  async fn insert_designer(&mut self, designer: &Designer) -> StoreResult<()> {
    sqlx::query("INSERT INTO designers (id, user_id, name, created_at) VALUES ($1, $2, $3, $4)")
      .bind(designer.id.0)
      .bind(designer.user_id.0)
      .bind(&designer.name)
      .bind(designer.created_at)
      .execute(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    for slot in &designer.slots {
      self.insert_slot(designer.id, slot).await?;
    }
    Ok(())
  }

  async fn insert_slot(&mut self, designer_id: DesignerId, slot: &AvailabilitySlot) -> StoreResult<bool> {
    let inserted = sqlx::query(
      "INSERT INTO availability_slots (id, designer_id, slot_date, start_time, end_time, status) \
       SELECT $1, $2, $3, $4, $5, $6 WHERE EXISTS (SELECT 1 FROM designers WHERE id = $2) \
       ON CONFLICT (designer_id, slot_date, start_time, end_time) DO NOTHING",
    )
    .bind(slot.id.0)
    .bind(designer_id.0)
    .bind(slot.time.date)
    .bind(slot.time.from.to_string())
    .bind(slot.time.to.to_string())
    .bind(slot.status.as_str())
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?
    .rows_affected();
    Ok(inserted == 1)
  }

  async fn book_slot(&mut self, designer_id: DesignerId, time: &SlotTime) -> StoreResult<Option<AvailabilitySlot>> {
    let row: Option<SlotRow> = sqlx::query_as(&format!(
      "UPDATE availability_slots SET status = 'booked' \
       WHERE designer_id = $1 AND slot_date = $2 AND start_time = $3 AND end_time = $4 AND status = 'available' \
       RETURNING {SLOT_COLUMNS}"
    ))
    .bind(designer_id.0)
    .bind(time.date)
    .bind(time.from.to_string())
    .bind(time.to.to_string())
    .fetch_optional(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    row.map(AvailabilitySlot::try_from).transpose()
  }

  async fn release_slot(&mut self, designer_id: DesignerId, slot_id: SlotId) -> StoreResult<bool> {
    let released = sqlx::query(
      "UPDATE availability_slots SET status = 'available' WHERE id = $1 AND designer_id = $2 AND status = 'booked'",
    )
    .bind(slot_id.0)
    .bind(designer_id.0)
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?
    .rows_affected();
    Ok(released == 1)
  }

  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    if !order.totals_consistent() {
      return Err(StoreError::Integrity(format!(
        "Order {} total {} != subtotal {} + shipping {}",
        order.id, order.total_cents, order.subtotal_cents, order.shipping_cents
      )));
    }
    sqlx::query(&format!(
      "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
    ))
    .bind(order.id.0)
    .bind(order.user_id.0)
    .bind(Json(&order.items))
    .bind(Json(&order.shipping_address))
    .bind(order.payment_method.as_str())
    .bind(order.subtotal_cents)
    .bind(order.shipping_cents)
    .bind(order.total_cents)
    .bind(order.status.as_str())
    .bind(order.notes.as_deref())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
  }

  async fn order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    row.map(Order::try_from).transpose()
  }

  async fn lock_order(&mut self, order_id: OrderId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
      .bind(order_id.0)
      .fetch_optional(&mut *self.tx)
      .await
      .map_err(map_sqlx)?;
    row.map(Order::try_from).transpose()
  }

  async fn orders_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id.0)
    .fetch_all(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    collect(rows)
  }

  async fn set_order_status(
    &mut self,
    order_id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<bool> {
    let updated = sqlx::query("UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2")
      .bind(order_id.0)
      .bind(from.as_str())
      .bind(to.as_str())
      .bind(updated_at)
      .execute(&mut *self.tx)
      .await
      .map_err(map_sqlx)?
      .rows_affected();
    Ok(updated == 1)
  }

  async fn insert_consultation(&mut self, consultation: &Consultation) -> StoreResult<()> {
    sqlx::query(&format!(
      "INSERT INTO consultations ({CONSULTATION_COLUMNS}) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
    ))
    .bind(consultation.id.0)
    .bind(consultation.order_id.0)
    .bind(consultation.homeowner_id.0)
    .bind(consultation.designer_id.0)
    .bind(consultation.slot_id.0)
    .bind(consultation.slot.date)
    .bind(consultation.slot.from.to_string())
    .bind(consultation.slot.to.to_string())
    .bind(consultation.price_cents)
    .bind(consultation.status.as_str())
    .bind(consultation.created_at)
    .bind(consultation.updated_at)
    .execute(&mut *self.tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
  }

  async fn set_consultation_status_for_order(
    &mut self,
    order_id: OrderId,
    status: ConsultationStatus,
    updated_at: DateTime<Utc>,
  ) -> StoreResult<u64> {
    let touched = sqlx::query("UPDATE consultations SET status = $2, updated_at = $3 WHERE order_id = $1")
      .bind(order_id.0)
      .bind(status.as_str())
      .bind(updated_at)
      .execute(&mut *self.tx)
      .await
      .map_err(map_sqlx)?
      .rows_affected();
    Ok(touched)
  }

  async fn consultations_for_user(&mut self, user_id: UserId) -> StoreResult<Vec<Consultation>> {
    self
      .consultations_where("homeowner_id", user_id.0, "created_at DESC")
      .await
  }

  async fn consultations_for_designer(&mut self, designer_id: DesignerId) -> StoreResult<Vec<Consultation>> {
    self
      .consultations_where("designer_id", designer_id.0, "slot_date, start_time")
      .await
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(map_sqlx)?;
    trace!("PostgreSQL transaction committed.");
    Ok(())
  }
}
