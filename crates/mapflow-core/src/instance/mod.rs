//! Ejecución viva del flujo de un servicio.
//!
//! La instancia mantiene el step actual, la pila de steps anteriores (el
//! camino realmente recorrido, incluidos los saltos de bifurcación) y el
//! estado acumulado. Avanzar apila, retroceder desapila.

mod snapshot;

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::WorkflowError;
use crate::rules::BranchResolution;
use crate::schema::{ServiceDefinition, StepDefinition};
use crate::state::WorkflowState;

pub use snapshot::{WorkflowSnapshot, WorkflowSummary};

/// Identifica "esta instancia, en este step". Los resultados de peticiones
/// lanzadas para un step solo se aplican mientras la guarda siga coincidiendo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepGuard {
    pub uuid: Uuid,
    pub generation: u64,
}

/// Resultado de una petición de avance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: Option<usize>, to: usize },
    /// Destino negativo o sin resolver: la instancia no se movió.
    Stayed,
}

#[derive(Debug, Clone)]
pub struct WorkflowInstance {
    uuid: Uuid,
    service_index: usize,
    service: Arc<ServiceDefinition>,
    current_index: Option<usize>,
    workflow_step: Option<StepDefinition>,
    prev_workflow_steps: Vec<StepDefinition>,
    prev_indices: Vec<Option<usize>>,
    state: WorkflowState,
    name: String,
    persisted: bool,
    resumable: bool,
    drive_paths: Vec<String>,
    generation: u64,
}

impl WorkflowInstance {
    /// Nueva instancia posicionada en el step 0 de `service`.
    pub fn start(service_index: usize, service: Arc<ServiceDefinition>) -> Result<Self, WorkflowError> {
        let first = service.workflow.first().cloned().ok_or(WorkflowError::EmptyWorkflow)?;
        Ok(Self { uuid: Uuid::new_v4(),
                  service_index,
                  name: service.name.clone(),
                  resumable: service.resumable,
                  service,
                  current_index: Some(0),
                  workflow_step: Some(first),
                  prev_workflow_steps: Vec::new(),
                  prev_indices: Vec::new(),
                  state: WorkflowState::new(),
                  persisted: false,
                  drive_paths: Vec::new(),
                  generation: 0 })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn service_index(&self) -> usize {
        self.service_index
    }

    pub fn service(&self) -> &Arc<ServiceDefinition> {
        &self.service
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.workflow_step.as_ref()
    }

    /// Position of the current step in the service, when known.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn previous_steps(&self) -> &[StepDefinition] {
        &self.prev_workflow_steps
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorkflowState {
        &mut self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_resumable(&self) -> bool {
        self.resumable
    }

    pub fn drive_paths(&self) -> &[String] {
        &self.drive_paths
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn guard(&self) -> StepGuard {
        StepGuard { uuid: self.uuid,
                    generation: self.generation }
    }

    pub fn matches(&self, guard: &StepGuard) -> bool {
        self.uuid == guard.uuid && self.generation == guard.generation
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_persistence(&mut self, persisted: bool) {
        self.persisted = persisted;
    }

    pub fn set_drive_paths(&mut self, paths: Vec<String>) {
        self.drive_paths = paths;
    }

    pub fn set_resumable(&mut self, resumable: bool) {
        self.resumable = resumable;
    }

    pub fn has_previous_step(&self) -> bool {
        !self.prev_workflow_steps.is_empty()
    }

    /// Hay que ofrecer un botón de retroceso: existe historial y el step
    /// actual declara un `previous_step` no negativo.
    pub fn can_go_back(&self) -> bool {
        self.has_previous_step() && self.workflow_step.as_ref().is_some_and(StepDefinition::allows_back)
    }

    /// Avanzar no puede llevar a ningún sitio desde aquí.
    pub fn is_terminal(&self) -> bool {
        let Some(step) = &self.workflow_step else {
            return true;
        };
        let forward = step.resolve_next(&self.state).target.is_some_and(|t| t >= 0);
        let by_option = step.option_targets().iter().any(|t| *t >= 0);
        !forward && !by_option
    }

    /// Avanza. `target` tiene prioridad sobre la resolución de bifurcaciones.
    pub fn do_next(&mut self, target: Option<i64>) -> Result<Transition, WorkflowError> {
        self.do_next_traced(target).map(|(t, _)| t)
    }

    /// Como [`do_next`](Self::do_next), pero devuelve además cómo se eligió
    /// el destino, incluidas las entradas de bifurcación saltadas por inválidas.
    pub fn do_next_traced(&mut self, target: Option<i64>) -> Result<(Transition, BranchResolution), WorkflowError> {
        let Some(current) = &self.workflow_step else {
            return Err(WorkflowError::NoActiveWorkflow);
        };
        let resolution = match target {
            Some(t) => BranchResolution::explicit(t),
            None => current.resolve_next(&self.state),
        };
        let index = match resolution.target {
            Some(i) if i >= 0 => i,
            _ => {
                debug!("workflow {}: no forward target from step {:?}, staying", self.uuid, self.current_index);
                return Ok((Transition::Stayed, resolution));
            }
        };
        let len = self.service.workflow.len();
        let next = usize::try_from(index).ok()
                                         .and_then(|i| self.service.workflow.get(i).map(|s| (i, s.clone())))
                                         .ok_or(WorkflowError::InvalidStepIndex { index, len })?;
        let (to, step) = next;
        let from = self.current_index;
        if let Some(prev) = self.workflow_step.replace(step) {
            self.prev_workflow_steps.push(prev);
            self.prev_indices.push(from);
        }
        self.current_index = Some(to);
        self.generation += 1;
        debug!("workflow {}: {:?} -> {} via {:?}", self.uuid, from, to, resolution.route);
        Ok((Transition::Advanced { from, to }, resolution))
    }

    /// Desapila la pila de navegación. Una pila vacía se informa como
    /// [`WorkflowError::NavigationUnderflow`] y deja la instancia como estaba.
    pub fn do_previous(&mut self) -> Result<&StepDefinition, WorkflowError> {
        let step = self.prev_workflow_steps.pop().ok_or(WorkflowError::NavigationUnderflow)?;
        let index = self.prev_indices.pop().flatten();
        debug!("workflow {}: back {:?} -> {:?}", self.uuid, self.current_index, index);
        self.current_index = index;
        self.generation += 1;
        Ok(self.workflow_step.insert(step))
    }

    /// Empieza de nuevo: estado e historial vacíos, de vuelta en el step 0.
    pub fn restart(&mut self) -> Result<(), WorkflowError> {
        let first = self.service.workflow.first().cloned().ok_or(WorkflowError::EmptyWorkflow)?;
        self.workflow_step = Some(first);
        self.current_index = Some(0);
        self.prev_workflow_steps.clear();
        self.prev_indices.clear();
        self.state.clear();
        self.generation += 1;
        Ok(())
    }

    /// Descarta el step actual. Las guardas pendientes dejan de coincidir.
    pub fn close(&mut self) {
        self.workflow_step = None;
        self.current_index = None;
        self.generation += 1;
    }
}
