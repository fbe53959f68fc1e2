//! El backend tal como lo ve el motor: sonda de sesión, fetch/post JSON y
//! comandos con nombre. Los formatos de cable son asunto de quien lo implementa.

mod canned;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use canned::{CannedTransport, RecordedCall};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// 401 or equivalent: the user has to sign in again.
    #[error("session expired")]
    Unauthorized,
    #[error("request failed: {status} {status_text}")]
    Status { status: u16, status_text: String },
    /// No response at all (connection refused, channel closed...).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RequestError {
    pub fn from_status(status: u16, status_text: impl Into<String>) -> Self {
        if status == 401 {
            RequestError::Unauthorized
        } else {
            RequestError::Status { status,
                                   status_text: status_text.into() }
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// `false` when the session is gone; callers abort the pending request.
    async fn session_check(&self) -> bool;
    async fn fetch_json(&self, url: &str, query: &Map<String, Value>) -> Result<Option<Value>, RequestError>;
    async fn post_json(&self, url: &str, payload: &Value) -> Result<Option<Value>, RequestError>;
    async fn emit_command(&self, name: &str, payload: &Value) -> Result<Option<Value>, RequestError>;
}
