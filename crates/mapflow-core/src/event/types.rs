//! Eventos del diario de un flujo.
//!
//! El diario es una traza de auditoría junto a la instancia: nunca dirige la
//! navegación, pero permite a un host (o a un test) ver qué camino se tomó y
//! por qué.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::Route;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEventKind {
    /// First event of a workflow id.
    WorkflowStarted {
        service_index: usize,
        service_name: String,
        definition_hash: String,
    },
    /// Forward transition.
    StepEntered {
        from: Option<usize>,
        to: usize,
        step_type: String,
        route: Route,
    },
    NavigatedBack { to: Option<usize> },
    /// A branch entry failed validation and was left out.
    RuleSkipped {
        step_index: Option<usize>,
        entry: usize,
        reason: String,
    },
    /// Keys written by a step handler.
    StateUpdated { keys: Vec<String> },
    WorkflowRestarted,
    WorkflowPersisted { saved_at: DateTime<Utc> },
    WorkflowReactivated { hash_matches: bool },
    WorkflowClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub seq: u64,
    pub workflow_id: Uuid,
    pub kind: WorkflowEventKind,
    pub ts: DateTime<Utc>,
}
