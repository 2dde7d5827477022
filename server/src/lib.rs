// src/lib.rs

//! HTTP server for the DecorVista marketplace: actix-web handlers over the
//! `decorvista` core, with a PostgreSQL or in-memory datastore.

pub mod config;
pub mod db;
pub mod errors;
pub mod state;
pub mod web;

use crate::config::{AppConfig, StoreBackend};
use crate::db::PgStore;
use crate::errors::{AppError, Result};
use crate::state::AppState;
use decorvista::{Datastore, MemoryStore};
use std::sync::Arc;

/// Opens the configured datastore (running migrations when asked) and wires
/// the services on top of it.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
  let store: Arc<dyn Datastore> = match config.store_backend {
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory datastore; data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
      let store = PgStore::connect(url, config.db_max_connections).await?;
      if config.run_migrations {
        store.migrate().await?;
      }
      Arc::new(store)
    }
  };

  let state = AppState::new(store, Arc::new(config));
  if state.config.seed_db {
    db::seed_demo_data(&state).await?;
  }
  Ok(state)
}
