use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::body::*;
use super::next::NextStep;
use crate::rules::{resolve_next_step, BranchResolution};
use crate::state::WorkflowState;

/// One entry of a service's `workflow` array.
///
/// On the wire a step is a flat object tagged by `type`; in memory the
/// type-specific keys live in [`StepBody`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub struct StepDefinition {
    pub name: String,
    pub description: String,
    pub next_step: Option<NextStep>,
    pub previous_step: Option<i64>,
    pub body: StepBody,
}

#[derive(Serialize, Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_step: Option<NextStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_step: Option<i64>,
    #[serde(flatten)]
    config: Map<String, Value>,
}

fn parse<T: DeserializeOwned>(config: Map<String, Value>) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(config))
}

fn flatten<T: Serialize>(config: &T) -> Map<String, Value> {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl TryFrom<RawStep> for StepDefinition {
    type Error = serde_json::Error;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let config = raw.config;
        let body = match raw.type_name.as_str() {
            "choice" => StepBody::Choice(parse(config)?),
            "form" => StepBody::Form(parse(config)?),
            "json-form" => StepBody::JsonForm(parse(config)?),
            "select-query" => StepBody::SelectQuery(parse(config)?),
            "multi-select-query" => StepBody::MultiSelectQuery(parse(config)?),
            "table-query" => StepBody::TableQuery(parse(config)?),
            "get_data" => StepBody::GetData(parse(config)?),
            "service" => StepBody::Service(parse(config)?),
            "download_file" => StepBody::DownloadFile(parse(config)?),
            "upload_file" => StepBody::UploadFile(parse(config)?),
            "http_post" => StepBody::HttpPost(parse(config)?),
            "call_js_function" => StepBody::CallFunction(parse(config)?),
            "progress" => StepBody::Progress(config),
            "text" => StepBody::Text(config),
            "custom" => StepBody::Custom(config),
            _ => StepBody::Unknown { type_name: raw.type_name.clone(),
                                     config },
        };
        Ok(StepDefinition { name: raw.name,
                            description: raw.description,
                            next_step: raw.next_step,
                            previous_step: raw.previous_step,
                            body })
    }
}

impl From<StepDefinition> for RawStep {
    fn from(step: StepDefinition) -> Self {
        let type_name = step.body.type_name().to_string();
        let config = match step.body {
            StepBody::Choice(c) => flatten(&c),
            StepBody::Form(c) => flatten(&c),
            StepBody::JsonForm(c) => flatten(&c),
            StepBody::SelectQuery(c) | StepBody::MultiSelectQuery(c) | StepBody::TableQuery(c) => flatten(&c),
            StepBody::GetData(c) => flatten(&c),
            StepBody::Service(c) => flatten(&c),
            StepBody::DownloadFile(c) | StepBody::UploadFile(c) | StepBody::HttpPost(c) => flatten(&c),
            StepBody::CallFunction(c) => flatten(&c),
            StepBody::Progress(m) | StepBody::Text(m) | StepBody::Custom(m) => m,
            StepBody::Unknown { config, .. } => config,
        };
        RawStep { type_name,
                  name: step.name,
                  description: step.description,
                  next_step: step.next_step,
                  previous_step: step.previous_step,
                  config }
    }
}

impl StepDefinition {
    pub fn new(name: impl Into<String>, body: StepBody) -> Self {
        Self { name: name.into(),
               description: String::new(),
               next_step: None,
               previous_step: None,
               body }
    }

    pub fn with_next(mut self, next: NextStep) -> Self {
        self.next_step = Some(next);
        self
    }

    pub fn with_previous(mut self, previous: i64) -> Self {
        self.previous_step = Some(previous);
        self
    }

    pub fn type_name(&self) -> &str {
        self.body.type_name()
    }

    /// Forward resolution against `state`, ignoring any per-option targets.
    pub fn resolve_next(&self, state: &WorkflowState) -> BranchResolution {
        resolve_next_step(self.next_step.as_ref(), state)
    }

    /// Back-navigation is allowed from this step.
    pub fn allows_back(&self) -> bool {
        self.previous_step.is_some_and(|p| p >= 0)
    }

    /// Targets of the step's choice options, if it is a choice step.
    pub fn option_targets(&self) -> Vec<i64> {
        match &self.body {
            StepBody::Choice(c) => c.options.iter().map(|o| o.next_step).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_known_type_and_keeps_extra_keys() {
        let v = json!({
            "type": "select-query",
            "name": "Pick a project",
            "source": {"url": "/api/projects", "request_params": {"owner": "user.id"}, "choices_attr": "items"},
            "target_variable": "project",
            "next_step": 2,
            "ui_hint": "compact"
        });
        let step: StepDefinition = serde_json::from_value(v.clone()).unwrap();
        match &step.body {
            StepBody::SelectQuery(q) => {
                assert_eq!(q.source.url, "/api/projects");
                assert_eq!(q.source.request_params.get("owner").map(String::as_str), Some("user.id"));
                assert_eq!(q.target_variable.as_deref(), Some("project"));
                assert_eq!(q.extra.get("ui_hint"), Some(&json!("compact")));
            }
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(serde_json::to_value(&step).unwrap(), v);
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let step: StepDefinition = serde_json::from_value(json!({"type": "hologram", "name": "x", "beam": 3})).unwrap();
        assert_eq!(step.type_name(), "hologram");
        assert!(matches!(&step.body, StepBody::Unknown { config, .. } if config.get("beam") == Some(&json!(3))));
    }

    #[test]
    fn call_function_uses_js_function_key() {
        let step: StepDefinition = serde_json::from_value(json!({
            "type": "call_js_function", "name": "zoom", "js_function": "zoomTo", "parameters": ["area.id"]
        })).unwrap();
        match step.body {
            StepBody::CallFunction(c) => {
                assert_eq!(c.js_function, "zoomTo");
                assert_eq!(c.parameters, vec!["area.id".to_string()]);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn back_navigation_flag() {
        let step = StepDefinition::new("t", StepBody::Text(Map::new()));
        assert!(!step.allows_back());
        assert!(step.clone().with_previous(0).allows_back());
        assert!(!step.with_previous(-1).allows_back());
    }
}
