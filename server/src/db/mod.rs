// src/db/mod.rs

pub mod pg_store;
pub mod seed;

pub use pg_store::PgStore;
pub use seed::seed_demo_data;
