//! `form` and `json-form` steps.

use mapflow_core::schema::{FormConfig, JsonFormConfig};
use mapflow_core::{StepDefinition, WorkflowInstance, WorkflowState};
use serde_json::Value;

use crate::error::StepError;
use crate::view::{ActionOutcome, StepView};

pub fn view(step: &StepDefinition, cfg: &FormConfig) -> StepView {
    StepView::Form { title: step.name.clone(),
                     description: step.description.clone(),
                     fields: cfg.fields.clone(),
                     multiple: cfg.multiple }
}

pub fn json_view(step: &StepDefinition, cfg: &JsonFormConfig) -> StepView {
    StepView::JsonForm { title: step.name.clone(),
                         schema: cfg.schema.clone() }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Coerces and checks the submitted pairs, writes them, then moves forward.
///
/// Submissions replace earlier values of the same keys, so submitting the same
/// input again after navigating back leaves the state as it was.
pub fn submit(instance: &mut WorkflowInstance, cfg: &FormConfig, pairs: Vec<(String, Value)>) -> Result<ActionOutcome, StepError> {
    let mut staged = WorkflowState::new();
    for (name, raw) in pairs {
        let value = match cfg.fields.iter().find(|f| f.name == name) {
            Some(field) => field.field_type
                                .coerce(&raw)
                                .map_err(|e| StepError::Validation(format!("{name}: {e}")))?,
            None => raw,
        };
        if cfg.multiple {
            staged.push_value(name, value);
        } else {
            staged.set_key(name, value);
        }
    }
    for field in &cfg.fields {
        if let (false, Some(default)) = (staged.contains_key(&field.name), &field.default) {
            staged.set_key(field.name.clone(), default.clone());
        }
    }
    let missing: Vec<&str> = cfg.fields
                                .iter()
                                .filter(|f| f.required && staged.get(&f.name).map_or(true, is_blank))
                                .map(|f| f.name.as_str())
                                .collect();
    if !missing.is_empty() {
        return Err(StepError::Validation(format!("required: {}", missing.join(", "))));
    }
    let keys = instance.state_mut().apply(staged.into_map());
    let transition = instance.do_next(None)?;
    Ok(ActionOutcome::Submitted { keys, transition })
}

/// Writes a submitted JSON document under `target_variable`, or key by key
/// when the step declares none.
pub fn submit_json(instance: &mut WorkflowInstance, cfg: &JsonFormConfig, value: Value) -> Result<ActionOutcome, StepError> {
    let keys = match (&cfg.target_variable, value) {
        (Some(target), v) => instance.state_mut().apply([(target.clone(), v)]),
        (None, Value::Object(map)) => instance.state_mut().apply(map),
        (None, other) => {
            return Err(StepError::Validation(format!("expected a JSON object, got {other}")));
        }
    };
    let transition = instance.do_next(None)?;
    Ok(ActionOutcome::Submitted { keys, transition })
}
