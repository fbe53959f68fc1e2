//! mapflow: motor de wizards de flujos del editor de mapas energéticos.
//!
//! Este crate une el workspace para los binarios:
//! - `config`: ajustes del host desde el entorno.
//! - `errors`: `CoreError` / `DomainError` de nivel superior.
//! - `host`: carga del catálogo y host de consola con diario.
//! - `console`: comandos de línea de `main-core`.
//!
//! Quien use la librería depende normalmente de `mapflow-core` y
//! `mapflow-adapters` directamente; sus tipos principales se re-exportan aquí.

pub mod config;
pub mod console;
pub mod errors;
pub mod host;

pub use mapflow_adapters::{ActionOutcome, StepDispatcher, StepView, Transport, UserAction};
pub use mapflow_core::{hashing, ServiceCatalog, WorkflowInstance, WorkflowSession, WorkflowState};
