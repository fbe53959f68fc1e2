//! Configuración del host. `.env` se lee una sola vez, luego el entorno del proceso.
//!
//! - `MAPFLOW_SERVICES`: JSON con el catálogo de servicios (por defecto `services.json`).
//! - `MAPFLOW_FIXTURES`: JSON opcional `{ruta: respuesta}` que contesta las
//!   peticiones al backend en el host de consola.
//! - `MAPFLOW_AUTOSAVE`: persiste en cada transición una vez que el flujo se
//!   guardó (desactivado por defecto).
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub services_path: PathBuf,
    pub fixtures_path: Option<PathBuf>,
    pub autosave: bool,
}

/// Process-wide configuration, evaluated on first use.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let services_path = lookup("MAPFLOW_SERVICES").filter(|s| !s.trim().is_empty())
                                                      .unwrap_or_else(|| "services.json".into());
        Self { services_path: PathBuf::from(services_path),
               fixtures_path: lookup("MAPFLOW_FIXTURES").filter(|s| !s.trim().is_empty()).map(PathBuf::from),
               autosave: lookup("MAPFLOW_AUTOSAVE").is_some_and(|v| parse_flag(&v)) }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
