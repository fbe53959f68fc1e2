//! mapflow-persistence
//!
//! Implementación Postgres de `mapflow_core::WorkflowStore` sobre Diesel, más
//! la configuración de conexión y las migraciones embebidas.
//!
//! - `pg`: construcción del pool, helper de reintentos y [`PgWorkflowStore`].
//! - `migrations`: ejecutor de migraciones embebidas.
//! - `config`: ajustes `DATABASE_*` desde el entorno / `.env`.
//! - `schema`: declaraciones de tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgPool, PgWorkflowStore, PoolProvider};
