use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{WorkflowEvent, WorkflowEventKind};

/// Append-only event storage.
pub trait EventStore {
    /// Appends an event and returns it with `seq` and `ts` filled in.
    fn append_kind(&mut self, workflow_id: Uuid, kind: WorkflowEventKind) -> WorkflowEvent;
    /// Events of one workflow, ascending by `seq`.
    fn list(&self, workflow_id: Uuid) -> Vec<WorkflowEvent>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<WorkflowEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, workflow_id: Uuid, kind: WorkflowEventKind) -> WorkflowEvent {
        let events = self.inner.entry(workflow_id).or_default();
        let ev = WorkflowEvent { seq: events.len() as u64,
                                 workflow_id,
                                 kind,
                                 ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, workflow_id: Uuid) -> Vec<WorkflowEvent> {
        self.inner.get(&workflow_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_per_workflow() {
        let mut store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.append_kind(a, WorkflowEventKind::WorkflowClosed);
        store.append_kind(b, WorkflowEventKind::WorkflowClosed);
        let second = store.append_kind(a, WorkflowEventKind::WorkflowRestarted);
        assert_eq!(second.seq, 1);
        assert_eq!(store.list(b).len(), 1);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }
}
