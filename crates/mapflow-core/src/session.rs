//! El único "flujo actual" de un host, con su store y su diario.
//!
//! Ciclo de vida: `start` (o `reactivate`) vuelve actual una instancia y
//! reemplaza la anterior; `persist` guarda una copia puntual; `close` la descarta.

use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::WorkflowError;
use crate::event::{EventStore, InMemoryEventStore, WorkflowEvent, WorkflowEventKind};
use crate::instance::{StepGuard, Transition, WorkflowInstance, WorkflowSummary};
use crate::rules::Route;
use crate::schema::{ServiceCatalog, ServiceDefinition};
use crate::store::WorkflowStore;

pub struct WorkflowSession<S, E = InMemoryEventStore> {
    current: Option<WorkflowInstance>,
    store: S,
    events: E,
    autosave: bool,
}

fn store_err<Err: std::error::Error>(e: Err) -> WorkflowError {
    error!("workflow store: {e}");
    WorkflowError::Store(e.to_string())
}

impl<S: WorkflowStore> WorkflowSession<S, InMemoryEventStore> {
    pub fn in_memory_journal(store: S) -> Self {
        Self::new(store, InMemoryEventStore::default())
    }
}

impl<S: WorkflowStore, E: EventStore> WorkflowSession<S, E> {
    pub fn new(store: S, events: E) -> Self {
        Self { current: None,
               store,
               events,
               autosave: false }
    }

    /// Con autosave activo, cada transición de una instancia ya persistida una
    /// vez se vuelve a persistir.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn current(&self) -> Option<&WorkflowInstance> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut WorkflowInstance> {
        self.current.as_mut()
    }

    fn active_mut(&mut self) -> Result<&mut WorkflowInstance, WorkflowError> {
        self.current.as_mut().ok_or(WorkflowError::NoActiveWorkflow)
    }

    /// Lanza `service` y reemplaza la instancia actual.
    pub fn start(&mut self, service_index: usize, service: Arc<ServiceDefinition>) -> Result<Uuid, WorkflowError> {
        let instance = WorkflowInstance::start(service_index, service)?;
        let uuid = instance.uuid();
        self.events.append_kind(uuid,
                                WorkflowEventKind::WorkflowStarted { service_index,
                                                                     service_name: instance.service().name.clone(),
                                                                     definition_hash: instance.service().definition_hash() });
        if let Some(old) = self.current.replace(instance) {
            debug!("workflow {} replaced by {}", old.uuid(), uuid);
        }
        info!("started workflow {uuid} for service #{service_index}");
        Ok(uuid)
    }

    pub fn next(&mut self, target: Option<i64>) -> Result<Transition, WorkflowError> {
        let instance = self.active_mut()?;
        let from = instance.current_index();
        let (transition, resolution) = instance.do_next_traced(target)?;
        let uuid = instance.uuid();
        let step_type = instance.current_step().map(|s| s.type_name().to_string()).unwrap_or_default();
        for skipped in &resolution.skipped {
            self.events.append_kind(uuid,
                                    WorkflowEventKind::RuleSkipped { step_index: from,
                                                                     entry: skipped.entry,
                                                                     reason: skipped.error.to_string() });
        }
        if let Transition::Advanced { from, to } = transition {
            self.events.append_kind(uuid,
                                    WorkflowEventKind::StepEntered { from,
                                                                     to,
                                                                     step_type,
                                                                     route: resolution.route });
            self.autosave_if_enabled();
        }
        Ok(transition)
    }

    /// Registra en el diario un avance que un handler ya hizo sobre la
    /// instancia actual (elección, envío de formulario). `Stayed` no registra nada.
    pub fn record_transition(&mut self, transition: Transition, route: Route) -> Result<(), WorkflowError> {
        let Transition::Advanced { from, to } = transition else {
            return Ok(());
        };
        let instance = self.active_mut()?;
        let uuid = instance.uuid();
        let step_type = instance.current_step().map(|s| s.type_name().to_string()).unwrap_or_default();
        self.events.append_kind(uuid,
                                WorkflowEventKind::StepEntered { from,
                                                                 to,
                                                                 step_type,
                                                                 route });
        self.autosave_if_enabled();
        Ok(())
    }

    /// Navegación hacia atrás. Devuelve el índice del step que queda actual.
    ///
    /// Un step sin `previous_step` no negativo rechaza retroceder aunque haya
    /// historial.
    pub fn previous(&mut self) -> Result<Option<usize>, WorkflowError> {
        let instance = self.active_mut()?;
        if instance.has_previous_step() && !instance.can_go_back() {
            return Err(WorkflowError::BackNotAllowed);
        }
        instance.do_previous()?;
        let (uuid, to) = (instance.uuid(), instance.current_index());
        self.events.append_kind(uuid, WorkflowEventKind::NavigatedBack { to });
        self.autosave_if_enabled();
        Ok(to)
    }

    pub fn restart(&mut self) -> Result<(), WorkflowError> {
        let instance = self.active_mut()?;
        instance.restart()?;
        let uuid = instance.uuid();
        self.events.append_kind(uuid, WorkflowEventKind::WorkflowRestarted);
        Ok(())
    }

    /// Descarta la instancia actual; las guardas pendientes dejan de coincidir.
    pub fn close(&mut self) -> Option<WorkflowInstance> {
        let mut instance = self.current.take()?;
        instance.close();
        self.events.append_kind(instance.uuid(), WorkflowEventKind::WorkflowClosed);
        Some(instance)
    }

    /// Registra las claves que un handler escribió en el estado actual.
    pub fn record_state_update(&mut self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        if let Some(uuid) = self.current.as_ref().map(WorkflowInstance::uuid) {
            self.events.append_kind(uuid, WorkflowEventKind::StateUpdated { keys });
        }
    }

    /// Guarda un snapshot de la instancia actual. La instancia solo se marca
    /// como persistida cuando el store lo aceptó.
    pub fn persist(&mut self) -> Result<WorkflowSummary, WorkflowError> {
        let mut snapshot = self.active_mut()?.snapshot();
        snapshot.persisted = true;
        self.store.persist(&snapshot).map_err(store_err)?;
        if let Some(instance) = self.current.as_mut() {
            instance.set_persistence(true);
        }
        self.events.append_kind(snapshot.uuid,
                                WorkflowEventKind::WorkflowPersisted { saved_at: snapshot.saved_at });
        debug!("persisted workflow {}", snapshot.uuid);
        Ok(snapshot.summary())
    }

    // Corre cuando la instancia ya se movió: un guardado fallido se registra
    // en el log y el movimiento se mantiene.
    fn autosave_if_enabled(&mut self) {
        let due = self.autosave && self.current.as_ref().is_some_and(WorkflowInstance::is_persisted);
        if !due {
            return;
        }
        if let Err(e) = self.persist() {
            let uuid = self.current.as_ref().map(WorkflowInstance::uuid);
            error!("autosave of workflow {uuid:?} failed: {e}");
        }
    }

    pub fn list_persisted(&self) -> Result<Vec<WorkflowSummary>, WorkflowError> {
        self.store.list().map_err(store_err)
    }

    /// Carga un flujo persistido y lo vuelve actual, re-enlazando su servicio
    /// desde `catalog`.
    pub fn reactivate(&mut self, uuid: Uuid, catalog: &ServiceCatalog) -> Result<(), WorkflowError> {
        let snapshot = self.store.load(uuid).map_err(store_err)?.ok_or(WorkflowError::WorkflowNotFound(uuid))?;
        let service = catalog.get(snapshot.service_index)
                             .ok_or(WorkflowError::ServiceNotFound(snapshot.service_index))?;
        let hash_matches = snapshot.definition_hash
                                   .as_ref()
                                   .map_or(true, |h| *h == service.definition_hash());
        if !hash_matches {
            warn!("reactivating workflow {uuid} against a changed service definition");
        }
        let instance = WorkflowInstance::from_snapshot(snapshot, service)?;
        self.current = Some(instance);
        self.events.append_kind(uuid, WorkflowEventKind::WorkflowReactivated { hash_matches });
        info!("reactivated workflow {uuid}");
        Ok(())
    }

    /// Elimina un flujo persistido. Una instancia actual con ese uuid sigue
    /// siendo actual pero deja de estar marcada como persistida.
    pub fn delete(&mut self, uuid: Uuid) -> Result<bool, WorkflowError> {
        let removed = self.store.delete(uuid).map_err(store_err)?;
        if let Some(instance) = self.current.as_mut().filter(|i| i.uuid() == uuid) {
            instance.set_persistence(false);
        }
        Ok(removed)
    }

    pub fn guard(&self) -> Option<StepGuard> {
        self.current.as_ref().map(WorkflowInstance::guard)
    }

    /// La guarda sigue apuntando a la instancia actual en el mismo step.
    pub fn is_current(&self, guard: &StepGuard) -> bool {
        self.current.as_ref().is_some_and(|i| i.matches(guard))
    }

    pub fn events_for(&self, uuid: Uuid) -> Vec<WorkflowEvent> {
        self.events.list(uuid)
    }
}
