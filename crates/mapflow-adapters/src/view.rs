//! Lo que un host renderiza para el step actual y lo que el usuario puede
//! hacer con él.

use mapflow_core::schema::{Extra, FormField};
use mapflow_core::Transition;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub label: String,
    pub description: String,
    pub target: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub label: String,
    pub value: Value,
}

/// Nested, human-readable rendering of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataNode {
    pub label: Option<String>,
    pub value: Option<String>,
    pub children: Vec<DataNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StepView {
    Choice { title: String, description: String, options: Vec<OptionView> },
    Form { title: String, description: String, fields: Vec<FormField>, multiple: bool },
    JsonForm { title: String, schema: Value },
    Select { title: String, items: Vec<ItemView>, multiple: bool },
    Table { title: String, columns: Vec<String>, rows: Vec<Value> },
    DataTree { title: String, root: DataNode },
    Download { title: String, file_name: Option<String> },
    Upload { title: String },
    Post { title: String },
    Call { title: String, function: String },
    Service { title: String, service: Value, params: Map<String, Value> },
    Progress { title: String, config: Extra },
    Text { title: String, description: String },
    Custom { title: String, config: Extra },
    /// Placeholder for a step type this engine does not know.
    Unknown { type_name: String },
    AuthRequired,
    Error { status: Option<u16>, message: String },
    /// A response arrived for a step that is no longer current.
    Stale,
    /// No current step.
    Closed,
}

/// Result of applying a [`UserAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Moved(Transition),
    Back(Option<usize>),
    /// A form was written to state, then forward navigation ran.
    Submitted { keys: Vec<String>, transition: Transition },
    /// Values were written to state; the workflow did not move.
    Updated { keys: Vec<String> },
    FileReady { name: String, bytes: Vec<u8> },
    Uploaded(Option<Value>),
    Called(Option<Value>),
    Posted(Option<Value>),
    /// The step has nowhere to go; the host clears its interaction area.
    Cleared,
    /// The navigation was refused: `Next` on an unknown step type, or
    /// `Previous` from a step that does not allow going back.
    Blocked,
}

impl ActionOutcome {
    /// State keys written by the action, for journaling.
    pub fn written_keys(&self) -> &[String] {
        match self {
            ActionOutcome::Submitted { keys, .. } | ActionOutcome::Updated { keys } => keys,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Next,
    Previous,
    /// Pick the choice option at this position.
    Choose(usize),
    /// `(field name, raw value)` pairs; names may repeat.
    SubmitForm(Vec<(String, Value)>),
    SubmitJson(Value),
    Select(Vec<Value>),
    UploadFile { name: String, bytes: Vec<u8> },
    Download,
    Call,
    Post,
}

impl UserAction {
    pub fn name(&self) -> &'static str {
        match self {
            UserAction::Next => "next",
            UserAction::Previous => "previous",
            UserAction::Choose(_) => "choose",
            UserAction::SubmitForm(_) => "submit form",
            UserAction::SubmitJson(_) => "submit json",
            UserAction::Select(_) => "select",
            UserAction::UploadFile { .. } => "upload",
            UserAction::Download => "download",
            UserAction::Call => "call",
            UserAction::Post => "post",
        }
    }
}
