//! Host de consola: un catálogo, una sesión y un dispatcher sobre un transporte.
//!
//! La navegación hacia adelante y hacia atrás pasa por la sesión, de modo que
//! cada transición queda en el diario con la ruta que la eligió. Las acciones
//! propias de cada step corren en el dispatcher; después el host registra las
//! claves escritas y el movimiento realizado, si lo hubo.

use std::fs;
use std::path::Path;

use log::{info, warn};
use mapflow_adapters::{ActionOutcome, FunctionRegistry, StepDispatcher, StepView, Transport, UserAction};
use mapflow_core::{InMemoryWorkflowStore, Route, ServiceCatalog, Transition, WorkflowError, WorkflowEvent,
                   WorkflowInstance, WorkflowSession, WorkflowStore, WorkflowSummary};
use uuid::Uuid;

use crate::errors::{CoreError, DomainError};

/// Reads a catalog file. Services with fatal schema issues reject the file;
/// warnings are logged.
pub fn load_catalog(path: &Path) -> Result<ServiceCatalog, CoreError> {
    let raw = fs::read_to_string(path)?;
    let catalog = ServiceCatalog::from_json_str(&raw).map_err(|e| DomainError::Validation(format!("{}: {e}", path.display())))?;
    for (i, service) in catalog.iter().enumerate() {
        let report = service.inspect();
        if report.is_fatal() {
            return Err(DomainError::Validation(format!("service #{i} '{}':\n{report}", service.name)).into());
        }
        for w in report.warnings() {
            warn!("service #{i} '{}': {w}", service.name);
        }
    }
    info!("loaded {} service(s) from {}", catalog.len(), path.display());
    Ok(catalog)
}

pub struct ConsoleHost<T: Transport, S: WorkflowStore = InMemoryWorkflowStore> {
    catalog: ServiceCatalog,
    session: WorkflowSession<S>,
    dispatcher: StepDispatcher,
    transport: T,
}

impl<T: Transport, S: WorkflowStore> ConsoleHost<T, S> {
    pub fn new(catalog: ServiceCatalog, store: S, transport: T, autosave: bool) -> Self {
        Self { catalog,
               session: WorkflowSession::in_memory_journal(store).with_autosave(autosave),
               dispatcher: StepDispatcher::default(),
               transport }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &WorkflowSession<S> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        self.dispatcher.functions_mut()
    }

    pub fn current(&self) -> Option<&WorkflowInstance> {
        self.session.current()
    }

    /// `[index] name` per service.
    pub fn services(&self) -> Vec<String> {
        self.catalog
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{i}] {}", s.name))
            .collect()
    }

    /// Starts a service picked by catalog position or by exact name.
    pub fn start(&mut self, which: &str) -> Result<Uuid, CoreError> {
        let index = which.trim()
                         .parse::<usize>()
                         .ok()
                         .filter(|i| *i < self.catalog.len())
                         .or_else(|| self.catalog.position(which.trim()))
                         .ok_or_else(|| DomainError::NotFound(format!("service '{which}'")))?;
        let service = self.catalog.get(index).ok_or(WorkflowError::ServiceNotFound(index))?;
        Ok(self.session.start(index, service)?)
    }

    pub async fn render(&self) -> StepView {
        match self.session.current() {
            Some(instance) => self.dispatcher.drive(instance, &self.transport).await,
            None => StepView::Closed,
        }
    }

    pub async fn act(&mut self, action: UserAction) -> Result<ActionOutcome, CoreError> {
        let instance = self.session.current().ok_or(WorkflowError::NoActiveWorkflow)?;
        let step = instance.current_step().cloned().ok_or(WorkflowError::NoActiveWorkflow)?;
        let back_held = StepDispatcher::hold_on_previous(instance);
        match action {
            UserAction::Previous => match back_held {
                Some(held) => Ok(held),
                None => Ok(ActionOutcome::Back(self.session.previous()?)),
            },
            UserAction::Next => match StepDispatcher::hold_on_next(&step) {
                Some(held) => Ok(held),
                None => Ok(ActionOutcome::Moved(self.session.next(None)?)),
            },
            other => {
                let chosen = matches!(other, UserAction::Choose(_));
                let instance = self.session.current_mut().ok_or(WorkflowError::NoActiveWorkflow)?;
                let outcome = self.dispatcher.act(instance, other, &self.transport).await?;
                let route = if chosen { Route::Explicit } else { replayed_route(instance) };
                self.session.record_state_update(outcome.written_keys().to_vec());
                if let Some(t) = moved_by(&outcome) {
                    self.session.record_transition(t, route)?;
                }
                Ok(outcome)
            }
        }
    }

    pub fn restart(&mut self) -> Result<(), CoreError> {
        Ok(self.session.restart()?)
    }

    pub fn close(&mut self) -> bool {
        self.session.close().is_some()
    }

    pub fn persist(&mut self) -> Result<WorkflowSummary, CoreError> {
        Ok(self.session.persist()?)
    }

    pub fn list(&self) -> Result<Vec<WorkflowSummary>, CoreError> {
        Ok(self.session.list_persisted()?)
    }

    pub fn resume(&mut self, uuid: Uuid) -> Result<(), CoreError> {
        Ok(self.session.reactivate(uuid, &self.catalog)?)
    }

    pub fn delete(&mut self, uuid: Uuid) -> Result<bool, CoreError> {
        Ok(self.session.delete(uuid)?)
    }

    /// Journal of the current workflow.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.session
            .current()
            .map(|i| self.session.events_for(i.uuid()))
            .unwrap_or_default()
    }
}

fn moved_by(outcome: &ActionOutcome) -> Option<Transition> {
    match outcome {
        ActionOutcome::Moved(t) | ActionOutcome::Submitted { transition: t, .. } => Some(*t),
        _ => None,
    }
}

// Routing is a pure function of step and state, so re-resolving the step we
// just left against the updated state reproduces the route taken.
fn replayed_route(instance: &WorkflowInstance) -> Route {
    instance.previous_steps()
            .last()
            .map_or(Route::Unresolved, |s| s.resolve_next(instance.state()).route)
}
