//! Ajustes de conexión desde el entorno (se respeta `.env`).

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::error::PersistenceError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    // a missing .env is fine
    let _ = dotenv();
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    /// Reads `DATABASE_URL` (required), `DATABASE_MIN_CONNECTIONS` (2) and
    /// `DATABASE_MAX_CONNECTIONS` (16).
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
        where F: Fn(&str) -> Option<String>
    {
        let url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty())
                                        .ok_or_else(|| PersistenceError::Config("DATABASE_URL is not set".into()))?;
        let number = |key: &str, default: u32| lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default);
        Ok(Self { url,
                  min_connections: number("DATABASE_MIN_CONNECTIONS", 2),
                  max_connections: number("DATABASE_MAX_CONNECTIONS", 16) })
    }
}

/// Loads `.env` once; later calls are no-ops.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
