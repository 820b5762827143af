//! Persistence layer for the fleetline dispatch subsystem.
//!
//! Provides:
//!
//! - [`models`] — row structs and write DTOs for drivers, zones, orders,
//!   carried inventory, the movement log, and notifications.
//! - [`store`] — the typed persistence port ([`store::DispatchStore`])
//!   consumed by every dispatch service, with per-operation capability
//!   negotiation.
//! - [`repositories`] — sqlx query modules over the PostgreSQL schema.
//! - [`postgres`] — [`postgres::PgDispatchStore`], the PostgreSQL
//!   implementation of the port.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod postgres;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Embedded migrations for the dispatch schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
