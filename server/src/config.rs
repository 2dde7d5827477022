// src/config.rs

use crate::errors::{AppError, Result};
use decorvista::PricingPolicy;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Memory,
  Postgres,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "memory" => Ok(StoreBackend::Memory),
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      other => Err(AppError::Config(format!("Invalid STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
  pub seed_db: bool,
  pub pricing: PricingPolicy,
  pub tx_max_attempts: u32,
  pub notification_capacity: usize,
  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Memory,
      database_url: None,
      db_max_connections: 10,
      run_migrations: true,
      seed_db: false,
      pricing: PricingPolicy::default(),
      tx_max_attempts: 3,
      notification_capacity: 256,
      log_format: LogFormat::Pretty,
    }
  }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|var_name| env::var(var_name).ok())?;
    tracing::info!(
      backend = ?config.store_backend,
      host = %config.server_host,
      port = config.server_port,
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = Self::default();
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

    let store_backend = match lookup("STORE_BACKEND") {
      Some(raw) => raw.parse::<StoreBackend>()?,
      None if database_url.is_some() => StoreBackend::Postgres,
      None => StoreBackend::Memory,
    };
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' for the postgres backend".to_string(),
      ));
    }

    let pricing = PricingPolicy {
      free_shipping_threshold_cents: parse_or(
        &lookup,
        "FREE_SHIPPING_THRESHOLD_CENTS",
        defaults.pricing.free_shipping_threshold_cents,
      )?,
      flat_shipping_cents: parse_or(&lookup, "FLAT_SHIPPING_CENTS", defaults.pricing.flat_shipping_cents)?,
    };
    if pricing.free_shipping_threshold_cents < 0 || pricing.flat_shipping_cents < 0 {
      return Err(AppError::Config("Shipping amounts cannot be negative".to_string()));
    }

    let tx_max_attempts = parse_or(&lookup, "TX_MAX_ATTEMPTS", defaults.tx_max_attempts)?;
    if tx_max_attempts == 0 {
      return Err(AppError::Config("TX_MAX_ATTEMPTS must be at least 1".to_string()));
    }

    Ok(Self {
      server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port)?,
      store_backend,
      database_url,
      db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
      run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", defaults.run_migrations)?,
      seed_db: parse_or(&lookup, "SEED_DB", defaults.seed_db)?,
      pricing,
      tx_max_attempts,
      notification_capacity: parse_or(&lookup, "NOTIFICATION_CAPACITY", defaults.notification_capacity)?,
      log_format: match lookup("LOG_FORMAT") {
        Some(raw) => raw.parse()?,
        None => defaults.log_format,
      },
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
