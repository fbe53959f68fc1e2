//! Configuración específica de cada tipo de step.
//!
//! Cada configuración guarda en `extra` las claves que no modela, así una
//! definición leída del backend se serializa de vuelta sin cambios.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::state::ParamMapping;

pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum StepBody {
    Choice(ChoiceConfig),
    Form(FormConfig),
    JsonForm(JsonFormConfig),
    SelectQuery(QueryConfig),
    MultiSelectQuery(QueryConfig),
    TableQuery(QueryConfig),
    GetData(GetDataConfig),
    Service(ServiceConfig),
    DownloadFile(RequestConfig),
    UploadFile(RequestConfig),
    HttpPost(RequestConfig),
    CallFunction(CallFunctionConfig),
    Progress(Extra),
    Text(Extra),
    Custom(Extra),
    /// A tag this engine does not know. Rendered as a placeholder, never
    /// advanced.
    Unknown { type_name: String, config: Extra },
}

impl StepBody {
    pub fn type_name(&self) -> &str {
        match self {
            StepBody::Choice(_) => "choice",
            StepBody::Form(_) => "form",
            StepBody::JsonForm(_) => "json-form",
            StepBody::SelectQuery(_) => "select-query",
            StepBody::MultiSelectQuery(_) => "multi-select-query",
            StepBody::TableQuery(_) => "table-query",
            StepBody::GetData(_) => "get_data",
            StepBody::Service(_) => "service",
            StepBody::DownloadFile(_) => "download_file",
            StepBody::UploadFile(_) => "upload_file",
            StepBody::HttpPost(_) => "http_post",
            StepBody::CallFunction(_) => "call_js_function",
            StepBody::Progress(_) => "progress",
            StepBody::Text(_) => "text",
            StepBody::Custom(_) => "custom",
            StepBody::Unknown { type_name, .. } => type_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceConfig {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One labelled option; its `next_step` overrides the step's own resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub next_step: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// Repeated names accumulate into a list instead of overwriting.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

/// Input type of a form field. Submitted values arrive as strings and are
/// coerced to the declared type before they are written to state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Integer,
    Boolean,
    Select,
    Other(String),
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" | "string" | "textarea" => FieldType::Text,
            "number" | "float" => FieldType::Number,
            "int" | "integer" => FieldType::Integer,
            "bool" | "boolean" | "checkbox" => FieldType::Boolean,
            "select" | "radio" => FieldType::Select,
            _ => FieldType::Other(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Select => "select",
            FieldType::Other(s) => s,
        };
        f.write_str(s)
    }
}

impl FieldType {
    /// Coerces a submitted value. Non-string input is taken as already typed.
    pub fn coerce(&self, raw: &Value) -> Result<Value, String> {
        let Value::String(s) = raw else {
            return Ok(raw.clone());
        };
        let trimmed = s.trim();
        match self {
            FieldType::Integer => trimmed.parse::<i64>()
                                         .map(Value::from)
                                         .map_err(|_| format!("'{s}' is not an integer")),
            FieldType::Number => {
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                trimmed.parse::<f64>()
                       .ok()
                       .and_then(serde_json::Number::from_f64)
                       .map(Value::Number)
                       .ok_or_else(|| format!("'{s}' is not a number"))
            }
            FieldType::Boolean => match trimmed {
                "true" | "on" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "off" | "0" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(format!("'{s}' is not a boolean")),
            },
            _ => Ok(raw.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonFormConfig {
    #[serde(default)]
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_variable: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Where a query step reads its data from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub url: String,
    /// `{query_param: state_field}`
    #[serde(default, skip_serializing_if = "ParamMapping::is_empty")]
    pub request_params: ParamMapping,
    /// Attribute of the response holding the items; the whole response when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices_attr: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_variable: Option<String>,
    /// Item attribute shown to the user; the item itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_attr: Option<String>,
    /// Item attribute written to state; the item itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_attr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetDataConfig {
    #[serde(default)]
    pub source: DataSource,
    /// Attributes shown per object; all of them when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: Value,
    #[serde(default, skip_serializing_if = "ParamMapping::is_empty")]
    pub request_params: ParamMapping,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Shared by `download_file`, `upload_file` and `http_post`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "ParamMapping::is_empty")]
    pub request_params: ParamMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallFunctionConfig {
    #[serde(default)]
    pub js_function: String,
    /// State paths, passed positionally.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_variable: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_coercion() {
        assert_eq!(FieldType::Integer.coerce(&json!(" 42 ")), Ok(json!(42)));
        assert_eq!(FieldType::Number.coerce(&json!("2.5")), Ok(json!(2.5)));
        assert_eq!(FieldType::Number.coerce(&json!("7")), Ok(json!(7)));
        assert_eq!(FieldType::Boolean.coerce(&json!("on")), Ok(json!(true)));
        assert_eq!(FieldType::Text.coerce(&json!("NL")), Ok(json!("NL")));
        assert!(FieldType::Integer.coerce(&json!("abc")).is_err());
        assert_eq!(FieldType::Integer.coerce(&json!(3)), Ok(json!(3)));
    }

    #[test]
    fn unknown_field_type_is_kept() {
        let t: FieldType = serde_json::from_value(json!("date")).unwrap();
        assert_eq!(t, FieldType::Other("date".into()));
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("date"));
    }
}
