use indexmap::IndexMap;
use std::convert::Infallible;
use uuid::Uuid;

use super::WorkflowStore;
use crate::instance::{WorkflowSnapshot, WorkflowSummary};

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    snapshots: IndexMap<Uuid, WorkflowSnapshot>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    type Error = Infallible;

    fn list(&self) -> Result<Vec<WorkflowSummary>, Self::Error> {
        let mut out: Vec<WorkflowSummary> = self.snapshots.values().map(WorkflowSnapshot::summary).collect();
        out.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(out)
    }

    fn load(&self, uuid: Uuid) -> Result<Option<WorkflowSnapshot>, Self::Error> {
        Ok(self.snapshots.get(&uuid).cloned())
    }

    fn persist(&mut self, snapshot: &WorkflowSnapshot) -> Result<(), Self::Error> {
        self.snapshots.insert(snapshot.uuid, snapshot.clone());
        Ok(())
    }

    fn delete(&mut self, uuid: Uuid) -> Result<bool, Self::Error> {
        Ok(self.snapshots.shift_remove(&uuid).is_some())
    }
}
