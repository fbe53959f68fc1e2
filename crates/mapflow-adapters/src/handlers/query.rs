//! Steps `select-query`, `multi-select-query` y `table-query`, más el lado de
//! la petición compartido con `get_data`.

use mapflow_core::schema::{DataSource, QueryConfig};
use mapflow_core::{StepDefinition, WorkflowInstance};
use serde_json::Value;

use super::display;
use crate::dispatcher::PendingRequest;
use crate::error::StepError;
use crate::view::{ActionOutcome, ItemView, StepView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    MultiSelect,
    Table,
}

/// Query parameters are read from state through `request_params`.
pub fn request(instance: &WorkflowInstance, source: &DataSource) -> PendingRequest {
    PendingRequest { guard: instance.guard(),
                     url: source.url.clone(),
                     query: instance.state().params_from(&source.request_params) }
}

/// Items of a response: the array under `choices_attr` (a dotted path), or
/// the response itself.
pub fn extract_items(response: Option<Value>, choices_attr: Option<&str>) -> Vec<Value> {
    let Some(root) = response else {
        return Vec::new();
    };
    let found = match choices_attr {
        Some(attr) => root.pointer(&format!("/{}", attr.replace('.', "/")))
                          .cloned()
                          .unwrap_or(Value::Null),
        None => root,
    };
    match found {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn item_view(item: &Value, cfg: &QueryConfig) -> ItemView {
    let label = match &cfg.label_attr {
        Some(attr) => item.get(attr).map(display).unwrap_or_default(),
        None => ["name", "label"].iter()
                                 .find_map(|k| item.get(*k))
                                 .map(display)
                                 .unwrap_or_else(|| display(item)),
    };
    let value = match &cfg.value_attr {
        Some(attr) => item.get(attr).cloned().unwrap_or(Value::Null),
        None => item.clone(),
    };
    ItemView { label, value }
}

pub fn render(step: &StepDefinition, cfg: &QueryConfig, kind: QueryKind, response: Option<Value>) -> StepView {
    let items = extract_items(response, cfg.source.choices_attr.as_deref());
    let title = step.name.clone();
    match kind {
        QueryKind::Table => {
            let columns = if cfg.columns.is_empty() {
                items.first()
                     .and_then(Value::as_object)
                     .map(|row| row.keys().cloned().collect())
                     .unwrap_or_default()
            } else {
                cfg.columns.clone()
            };
            StepView::Table { title,
                              columns,
                              rows: items }
        }
        QueryKind::Select | QueryKind::MultiSelect => StepView::Select { title,
                                                                         items: items.iter().map(|i| item_view(i, cfg)).collect(),
                                                                         multiple: kind == QueryKind::MultiSelect },
    }
}

/// Writes the selection under `target_variable`: one value for a single
/// select, a list otherwise.
pub fn select(instance: &mut WorkflowInstance, cfg: &QueryConfig, multiple: bool, values: Vec<Value>) -> Result<ActionOutcome, StepError> {
    let target = cfg.target_variable
                    .as_deref()
                    .ok_or_else(|| StepError::Validation("step declares no target_variable".into()))?;
    let value = if multiple {
        Value::Array(values)
    } else {
        match <[Value; 1]>::try_from(values) {
            Ok([single]) => single,
            Err(v) => return Err(StepError::Validation(format!("expected one selection, got {}", v.len()))),
        }
    };
    instance.state_mut().set_key(target, value);
    Ok(ActionOutcome::Updated { keys: vec![target.to_string()] })
}
