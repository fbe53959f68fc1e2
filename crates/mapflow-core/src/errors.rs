//! Errores del núcleo de flujos.
//!
//! Los fallos de red y de peticiones nunca llegan a esta capa: los handlers de
//! `mapflow-adapters` los convierten en vistas de step. Aquí quedan los
//! errores de navegación y de contabilidad.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum WorkflowError {
    #[error("service has an empty workflow")] EmptyWorkflow,
    #[error("step index {index} out of range (workflow has {len} steps)")]
    InvalidStepIndex { index: i64, len: usize },
    #[error("no previous step to return to")] NavigationUnderflow,
    #[error("the current step does not allow going back")] BackNotAllowed,
    #[error("no active workflow")] NoActiveWorkflow,
    #[error("service {0} not found in catalog")] ServiceNotFound(usize),
    #[error("workflow {0} not found")] WorkflowNotFound(Uuid),
    #[error("store: {0}")] Store(String),
}
