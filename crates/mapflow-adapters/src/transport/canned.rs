use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{RequestError, Transport};

/// One request seen by a [`CannedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Fetch { url: String, query: Map<String, Value> },
    Post { url: String, payload: Value },
    Command { name: String, payload: Value },
}

type Reply = Result<Option<Value>, RequestError>;

/// Transport answering from a fixed table, keyed by url or command name.
/// Unrouted requests get a 404. Used by the console host and by tests.
#[derive(Default)]
pub struct CannedTransport {
    routes: HashMap<String, Reply>,
    session_expired: AtomicBool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: impl Into<String>, body: Value) -> Self {
        self.routes.insert(key.into(), Ok(Some(body)));
        self
    }

    pub fn route_reply(mut self, key: impl Into<String>, reply: Reply) -> Self {
        self.routes.insert(key.into(), reply);
        self
    }

    /// Builds routes from a JSON object `{key: body}`.
    pub fn from_routes(routes: &Map<String, Value>) -> Self {
        routes.iter()
              .fold(Self::new(), |t, (k, v)| t.route(k.clone(), v.clone()))
    }

    pub fn expire_session(&self) {
        self.session_expired.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn reply(&self, key: &str) -> Reply {
        self.routes
            .get(key)
            .cloned()
            .unwrap_or_else(|| Err(RequestError::from_status(404, "Not Found")))
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn session_check(&self) -> bool {
        !self.session_expired.load(Ordering::SeqCst)
    }

    async fn fetch_json(&self, url: &str, query: &Map<String, Value>) -> Result<Option<Value>, RequestError> {
        self.record(RecordedCall::Fetch { url: url.to_string(),
                                          query: query.clone() });
        self.reply(url)
    }

    async fn post_json(&self, url: &str, payload: &Value) -> Result<Option<Value>, RequestError> {
        self.record(RecordedCall::Post { url: url.to_string(),
                                         payload: payload.clone() });
        self.reply(url)
    }

    async fn emit_command(&self, name: &str, payload: &Value) -> Result<Option<Value>, RequestError> {
        self.record(RecordedCall::Command { name: name.to_string(),
                                            payload: payload.clone() });
        self.reply(name)
    }
}
