//! mapflow-core: motor de wizards de flujos del editor de mapas.
//!
//! Un servicio es una lista ordenada de steps leída del backend. Un
//! [`WorkflowInstance`] la recorre acumulando las respuestas del usuario en un
//! [`WorkflowState`]; las reglas de bifurcación eligen el siguiente step a
//! partir de ese estado. Render, transporte y handlers de steps viven en
//! `mapflow-adapters`.
pub mod constants;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod instance;
pub mod rules;
pub mod schema;
pub mod session;
pub mod state;
pub mod store;

pub use errors::WorkflowError;
pub use event::{EventStore, InMemoryEventStore, WorkflowEvent, WorkflowEventKind};
pub use instance::{StepGuard, Transition, WorkflowInstance, WorkflowSnapshot, WorkflowSummary};
pub use rules::{evaluate, resolve_next_step, BranchResolution, Route};
pub use schema::{NextStep, ServiceCatalog, ServiceDefinition, StepBody, StepDefinition};
pub use session::WorkflowSession;
pub use state::{ParamMapping, WorkflowState};
pub use store::{InMemoryWorkflowStore, WorkflowStore};
