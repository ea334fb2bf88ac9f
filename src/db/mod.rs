//! Database layer
//!
//! SQLite via sqlx, with code-embedded migrations and trait-based
//! repositories over the entity tables.
//!
//! # Usage
//!
//! ```ignore
//! use agrimart::config::DatabaseConfig;
//! use agrimart::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping};
