//! Un módulo de handler por familia de tipos de step. Los handlers preparan
//! sus escrituras y solo tocan el estado del flujo cuando toda la interacción
//! tuvo éxito.

pub mod call;
pub mod choice;
pub mod data;
pub mod form;
pub mod query;
pub mod transfer;

use log::debug;
use serde_json::Value;

use crate::error::StepError;
use crate::transport::Transport;

pub(crate) async fn guarded_post(transport: &dyn Transport, url: &str, payload: &Value) -> Result<Option<Value>, StepError> {
    if !transport.session_check().await {
        return Err(StepError::AuthExpired);
    }
    debug!("POST {url}");
    Ok(transport.post_json(url, payload).await?)
}

/// Text of a scalar for display; JSON for anything else.
pub(crate) fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
