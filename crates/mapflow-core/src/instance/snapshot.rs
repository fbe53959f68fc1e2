//! Copia puntual de una instancia, tal como se intercambia con el backend de
//! persistencia. La definición del servicio nunca se guarda; se vuelve a
//! enlazar desde el catálogo del llamador al reactivar.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::WorkflowInstance;
use crate::constants::SNAPSHOT_VERSION;
use crate::errors::WorkflowError;
use crate::schema::{ServiceDefinition, StepDefinition};
use crate::state::WorkflowState;

fn snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    pub uuid: Uuid,
    #[serde(default)]
    pub service_index: usize,
    #[serde(rename = "workflowStep", default)]
    pub workflow_step: Option<StepDefinition>,
    #[serde(rename = "prevWorkflowSteps", default)]
    pub prev_workflow_steps: Vec<StepDefinition>,
    #[serde(rename = "workflowStepIndex", default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(rename = "prevWorkflowStepIndices", default, skip_serializing_if = "Vec::is_empty")]
    pub prev_indices: Vec<Option<usize>>,
    #[serde(default)]
    pub state: WorkflowState,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub persisted: bool,
    #[serde(default)]
    pub drive_paths: Vec<String>,
    #[serde(default)]
    pub resumable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_hash: Option<String>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

/// List entry for persisted workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub uuid: Uuid,
    pub name: String,
    pub service_index: usize,
    pub saved_at: DateTime<Utc>,
    pub resumable: bool,
}

impl WorkflowSnapshot {
    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary { uuid: self.uuid,
                          name: self.name.clone(),
                          service_index: self.service_index,
                          saved_at: self.saved_at,
                          resumable: self.resumable }
    }
}

impl WorkflowInstance {
    /// Deep copy of everything but the service. Later mutations of the
    /// instance do not reach the snapshot.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot { version: SNAPSHOT_VERSION,
                           uuid: self.uuid,
                           service_index: self.service_index,
                           workflow_step: self.workflow_step.clone(),
                           prev_workflow_steps: self.prev_workflow_steps.clone(),
                           step_index: self.current_index,
                           prev_indices: self.prev_indices.clone(),
                           state: self.state.clone(),
                           name: self.name.clone(),
                           persisted: self.persisted,
                           drive_paths: self.drive_paths.clone(),
                           resumable: self.resumable,
                           definition_hash: Some(self.service.definition_hash()),
                           saved_at: Utc::now() }
    }

    /// Rebuilds an instance from a snapshot and the service it belongs to.
    ///
    /// Step positions missing from older snapshots are recovered by looking
    /// the step up in the service. A definition hash that no longer matches
    /// is logged, not rejected.
    pub fn from_snapshot(snapshot: WorkflowSnapshot, service: Arc<ServiceDefinition>) -> Result<Self, WorkflowError> {
        let len = service.workflow.len();
        if let Some(i) = snapshot.step_index.filter(|i| *i >= len) {
            return Err(WorkflowError::InvalidStepIndex { index: i as i64, len });
        }
        if let Some(stored) = &snapshot.definition_hash {
            let current = service.definition_hash();
            if *stored != current {
                warn!("workflow {}: service '{}' changed since it was saved ({} != {})",
                      snapshot.uuid, service.name, stored, current);
            }
        }
        let locate = |step: &StepDefinition| service.workflow.iter().position(|s| s == step);
        let current_index = match (&snapshot.workflow_step, snapshot.step_index) {
            (None, _) => None,
            (Some(_), Some(i)) => Some(i),
            (Some(step), None) => locate(step),
        };
        let prev_indices = if snapshot.prev_indices.len() == snapshot.prev_workflow_steps.len() {
            snapshot.prev_indices
        } else {
            snapshot.prev_workflow_steps.iter().map(locate).collect()
        };
        Ok(Self { uuid: snapshot.uuid,
                  service_index: snapshot.service_index,
                  service,
                  current_index,
                  workflow_step: snapshot.workflow_step,
                  prev_workflow_steps: snapshot.prev_workflow_steps,
                  prev_indices,
                  state: snapshot.state,
                  name: snapshot.name,
                  persisted: snapshot.persisted,
                  resumable: snapshot.resumable,
                  drive_paths: snapshot.drive_paths,
                  generation: 0 })
    }
}
