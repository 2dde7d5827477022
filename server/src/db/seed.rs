// src/db/seed.rs

//! Demo catalog for a fresh deployment (`SEED_DB=true`).

use crate::errors::Result;
use crate::state::AppState;
use chrono::{Days, Utc};
use decorvista::{Actor, SlotTime, TimeOfDay, UserId};
use tracing::{info, instrument};

const PRODUCTS: &[(&str, i64, u32)] = &[
  ("Walnut Coffee Table", 34_900, 8),
  ("Linen Throw Pillow", 2_900, 40),
  ("Brass Floor Lamp", 12_500, 12),
  ("Hand-Woven Jute Rug", 18_900, 6),
  ("Ceramic Table Vase", 4_500, 25),
];

const DESIGNER_HOURS: &[(u8, u8)] = &[(9, 10), (11, 12), (14, 15)];

/// Seeds products and one designer with a week of slots. Does nothing when
/// the catalog already has products.
#[instrument(name = "db::seed_demo_data", skip(state), err(Display))]
pub async fn seed_demo_data(state: &AppState) -> Result<()> {
  if state.catalog.list_products(Some(1), Some(1)).await?.total > 0 {
    info!("Catalog already populated, skipping seed.");
    return Ok(());
  }

  let system = Actor::admin(UserId::new());
  for (title, price_cents, inventory) in PRODUCTS {
    state
      .catalog
      .create_product(system, title.to_string(), *price_cents, *inventory)
      .await?;
  }

  let designer = state
    .catalog
    .create_designer(system, UserId::new(), "Amara Okafor".to_string())
    .await?;
  let today = Utc::now().date_naive();
  let mut slots = 0;
  for day in 1..=7u64 {
    let Some(date) = today.checked_add_days(Days::new(day)) else {
      continue;
    };
    for (from, to) in DESIGNER_HOURS {
      if let (Some(from), Some(to)) = (TimeOfDay::new(*from, 0), TimeOfDay::new(*to, 0)) {
        state.catalog.add_slot(system, designer.id, SlotTime::new(date, from, to)).await?;
        slots += 1;
      }
    }
  }

  info!(
    products = PRODUCTS.len(),
    designer_id = %designer.id,
    designer_user_id = %designer.user_id,
    slots,
    "Demo data seeded."
  );
  Ok(())
}
