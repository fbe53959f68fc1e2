//! Contrato de persistencia para snapshots de flujos.
//!
//! El backend guarda como mucho un snapshot por uuid de flujo; persistir de
//! nuevo lo reemplaza. Implementaciones: [`InMemoryWorkflowStore`] aquí, un
//! store Postgres en `mapflow-persistence` y un store por comandos en
//! `mapflow-adapters`.

mod memory;

use uuid::Uuid;

use crate::instance::{WorkflowSnapshot, WorkflowSummary};

pub use memory::InMemoryWorkflowStore;

pub trait WorkflowStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Summaries, most recently saved first.
    fn list(&self) -> Result<Vec<WorkflowSummary>, Self::Error>;
    fn load(&self, uuid: Uuid) -> Result<Option<WorkflowSnapshot>, Self::Error>;
    /// Inserts or replaces the snapshot for `snapshot.uuid`.
    fn persist(&mut self, snapshot: &WorkflowSnapshot) -> Result<(), Self::Error>;
    /// `true` if something was removed.
    fn delete(&mut self, uuid: Uuid) -> Result<bool, Self::Error>;
}
