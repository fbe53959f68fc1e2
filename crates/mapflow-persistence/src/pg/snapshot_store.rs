use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde_json::Value;
use uuid::Uuid;

use mapflow_core::{WorkflowSnapshot, WorkflowStore, WorkflowSummary};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::workflow_snapshots;

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = workflow_snapshots, primary_key(uuid))]
struct SnapshotRow<'a> {
    uuid: &'a Uuid,
    name: &'a str,
    service_index: i32,
    definition_hash: Option<&'a str>,
    resumable: bool,
    saved_at: DateTime<Utc>,
    payload: &'a Value,
}

#[derive(Queryable, Debug)]
struct SummaryRow {
    uuid: Uuid,
    name: String,
    service_index: i32,
    resumable: bool,
    saved_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for WorkflowSummary {
    type Error = PersistenceError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let service_index = usize::try_from(row.service_index)
            .map_err(|_| PersistenceError::Decode(format!("negative service_index {}", row.service_index)))?;
        Ok(WorkflowSummary { uuid: row.uuid,
                             name: row.name,
                             service_index,
                             saved_at: row.saved_at,
                             resumable: row.resumable })
    }
}

/// Snapshot store over the `workflow_snapshots` table. Each snapshot is one
/// row keyed by workflow uuid; the full snapshot lives in `payload` and the
/// listing columns are denormalised next to it.
pub struct PgWorkflowStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgWorkflowStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of stored snapshots.
    pub fn count(&self) -> Result<i64, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(workflow_snapshots::table.count().get_result(&mut conn)?)
        })
    }
}

impl<P: ConnectionProvider> WorkflowStore for PgWorkflowStore<P> {
    type Error = PersistenceError;

    fn list(&self) -> Result<Vec<WorkflowSummary>, Self::Error> {
        let rows: Vec<SummaryRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(workflow_snapshots::table.select((workflow_snapshots::uuid,
                                                 workflow_snapshots::name,
                                                 workflow_snapshots::service_index,
                                                 workflow_snapshots::resumable,
                                                 workflow_snapshots::saved_at))
                                        .order(workflow_snapshots::saved_at.desc())
                                        .load::<SummaryRow>(&mut conn)?)
        })?;
        rows.into_iter().map(WorkflowSummary::try_from).collect()
    }

    fn load(&self, uuid: Uuid) -> Result<Option<WorkflowSnapshot>, Self::Error> {
        let payload: Option<Value> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(workflow_snapshots::table.find(uuid)
                                        .select(workflow_snapshots::payload)
                                        .first::<Value>(&mut conn)
                                        .optional()?)
        })?;
        payload.map(|p| serde_json::from_value(p).map_err(PersistenceError::from))
               .transpose()
    }

    fn persist(&mut self, snapshot: &WorkflowSnapshot) -> Result<(), Self::Error> {
        let payload = serde_json::to_value(snapshot)?;
        let service_index = i32::try_from(snapshot.service_index)
            .map_err(|_| PersistenceError::CheckViolation(format!("service_index {} out of range", snapshot.service_index)))?;
        let row = SnapshotRow { uuid: &snapshot.uuid,
                                name: &snapshot.name,
                                service_index,
                                definition_hash: snapshot.definition_hash.as_deref(),
                                resumable: snapshot.resumable,
                                saved_at: snapshot.saved_at,
                                payload: &payload };
        let written = with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(diesel::insert_into(workflow_snapshots::table).values(&row)
                                                             .on_conflict(workflow_snapshots::uuid)
                                                             .do_update()
                                                             .set(&row)
                                                             .execute(&mut conn)?)
        })?;
        debug!("persisted snapshot {} ({written} row)", snapshot.uuid);
        Ok(())
    }

    fn delete(&mut self, uuid: Uuid) -> Result<bool, Self::Error> {
        let removed = with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(diesel::delete(workflow_snapshots::table.find(uuid)).execute(&mut conn)?)
        })?;
        Ok(removed > 0)
    }
}
