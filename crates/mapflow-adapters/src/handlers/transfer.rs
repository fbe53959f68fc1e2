//! Steps `download_file`, `upload_file` y `http_post`. El contenido de los
//! ficheros viaja codificado en base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mapflow_core::schema::RequestConfig;
use mapflow_core::WorkflowInstance;
use serde_json::{Map, Value};

use super::guarded_post;
use crate::error::StepError;
use crate::transport::Transport;
use crate::view::ActionOutcome;

fn params(instance: &WorkflowInstance, cfg: &RequestConfig) -> Map<String, Value> {
    instance.state().params_from(&cfg.request_params)
}

fn store_response(instance: &mut WorkflowInstance, cfg: &RequestConfig, response: &Option<Value>) {
    if let (Some(target), Some(value)) = (&cfg.target_variable, response) {
        instance.state_mut().set_key(target.clone(), value.clone());
    }
}

/// Accepts either a bare base64 string or `{name?|file_name?, file|content}`.
fn decode_file(response: Option<Value>) -> Result<(Option<String>, Vec<u8>), StepError> {
    let (name, encoded) = match response {
        Some(Value::String(s)) => (None, s),
        Some(Value::Object(map)) => {
            let name = ["name", "file_name"].iter()
                                            .find_map(|k| map.get(*k).and_then(Value::as_str))
                                            .map(str::to_string);
            let encoded = ["file", "content"].iter()
                                             .find_map(|k| map.get(*k).and_then(Value::as_str))
                                             .ok_or_else(|| StepError::Decode("response carries no file content".into()))?;
            (name, encoded.to_string())
        }
        Some(other) => return Err(StepError::Decode(format!("unexpected download response {other}"))),
        None => return Err(StepError::Decode("empty download response".into())),
    };
    let bytes = STANDARD.decode(encoded.trim())
                        .map_err(|e| StepError::Decode(e.to_string()))?;
    Ok((name, bytes))
}

pub async fn download(instance: &WorkflowInstance, cfg: &RequestConfig, transport: &dyn Transport) -> Result<ActionOutcome, StepError> {
    let payload = Value::Object(params(instance, cfg));
    let response = guarded_post(transport, &cfg.url, &payload).await?;
    let (name, bytes) = decode_file(response)?;
    let name = name.or_else(|| cfg.file_name.clone())
                   .unwrap_or_else(|| "download".to_string());
    Ok(ActionOutcome::FileReady { name, bytes })
}

pub async fn upload(instance: &mut WorkflowInstance,
                    cfg: &RequestConfig,
                    name: String,
                    bytes: Vec<u8>,
                    transport: &dyn Transport)
                    -> Result<ActionOutcome, StepError> {
    let mut payload = params(instance, cfg);
    payload.insert("file_name".into(), Value::String(name));
    payload.insert("file".into(), Value::String(STANDARD.encode(bytes)));
    let response = guarded_post(transport, &cfg.url, &Value::Object(payload)).await?;
    store_response(instance, cfg, &response);
    Ok(ActionOutcome::Uploaded(response))
}

pub async fn post(instance: &mut WorkflowInstance, cfg: &RequestConfig, transport: &dyn Transport) -> Result<ActionOutcome, StepError> {
    let payload = Value::Object(params(instance, cfg));
    let response = guarded_post(transport, &cfg.url, &payload).await?;
    store_response(instance, cfg, &response);
    Ok(ActionOutcome::Posted(response))
}
