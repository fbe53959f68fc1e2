//! Diario del flujo: tipos de evento y el store de solo-append.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{WorkflowEvent, WorkflowEventKind};
