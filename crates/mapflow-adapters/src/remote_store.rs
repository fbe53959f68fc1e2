//! Snapshots de flujos guardados por el backend, accesibles mediante comandos con nombre.

use log::debug;
use mapflow_core::{WorkflowSnapshot, WorkflowSummary};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::transport::{RequestError, Transport};

pub const CMD_LIST: &str = "/workflow/list";
pub const CMD_LOAD: &str = "/workflow/load";
pub const CMD_PERSIST: &str = "/workflow/persist";
pub const CMD_DELETE: &str = "/workflow/delete";

#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("session expired")]
    AuthExpired,
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("malformed snapshot from backend: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct RemoteWorkflowStore<T> {
    transport: T,
}

impl<T: Transport> RemoteWorkflowStore<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn command(&self, name: &str, payload: Value) -> Result<Option<Value>, RemoteStoreError> {
        if !self.transport.session_check().await {
            return Err(RemoteStoreError::AuthExpired);
        }
        debug!("command {name}");
        Ok(self.transport.emit_command(name, &payload).await?)
    }

    /// Most recently saved first.
    pub async fn list(&self) -> Result<Vec<WorkflowSummary>, RemoteStoreError> {
        let items = match self.command(CMD_LIST, json!({})).await? {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let mut out = items.into_iter()
                           .map(|v| serde_json::from_value::<WorkflowSnapshot>(v).map(|s| s.summary()))
                           .collect::<Result<Vec<_>, _>>()?;
        out.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(out)
    }

    pub async fn load(&self, uuid: Uuid) -> Result<Option<WorkflowSnapshot>, RemoteStoreError> {
        match self.command(CMD_LOAD, json!({ "uuid": uuid })).await? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
        }
    }

    pub async fn persist(&self, snapshot: &WorkflowSnapshot) -> Result<(), RemoteStoreError> {
        self.command(CMD_PERSIST, serde_json::to_value(snapshot)?).await?;
        Ok(())
    }

    /// The backend may answer `true`/`false`, `{"deleted": bool}` or
    /// nothing; nothing counts as deleted.
    pub async fn delete(&self, uuid: Uuid) -> Result<bool, RemoteStoreError> {
        let reply = self.command(CMD_DELETE, json!({ "uuid": uuid })).await?;
        Ok(match reply {
            Some(Value::Bool(b)) => b,
            Some(v) => v.get("deleted").and_then(Value::as_bool).unwrap_or(true),
            None => true,
        })
    }
}
