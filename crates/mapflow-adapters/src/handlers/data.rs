//! `get_data` steps: a read-only tree view of the response.

use mapflow_core::schema::GetDataConfig;
use mapflow_core::StepDefinition;
use serde_json::Value;

use super::display;
use crate::view::{DataNode, StepView};

pub fn render(step: &StepDefinition, cfg: &GetDataConfig, response: Option<Value>) -> StepView {
    let root = response.map(|v| walk(None, &v, &cfg.fields)).unwrap_or_default();
    StepView::DataTree { title: step.name.clone(),
                         root }
}

/// `fields` filters scalar attributes of objects; nested containers are
/// always descended into.
pub fn walk(label: Option<String>, value: &Value, fields: &[String]) -> DataNode {
    match value {
        Value::Object(map) => {
            let children = map.iter()
                              .filter(|(k, v)| fields.is_empty() || v.is_object() || v.is_array() || fields.contains(*k))
                              .map(|(k, v)| walk(Some(k.clone()), v, fields))
                              .collect();
            DataNode { label,
                       value: None,
                       children }
        }
        Value::Array(items) => DataNode { label,
                                          value: None,
                                          children: items.iter().map(|v| walk(None, v, fields)).collect() },
        Value::Null => DataNode { label,
                                  value: None,
                                  children: Vec::new() },
        scalar => DataNode { label,
                             value: Some(display(scalar)),
                             children: Vec::new() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_and_filters_scalars() {
        let v = json!({"name": "Substation A", "internal": 7, "feeders": [{"name": "F1", "load": 0.4}]});
        let fields = vec!["name".to_string()];
        let root = walk(None, &v, &fields);
        let labels: Vec<_> = root.children.iter().filter_map(|c| c.label.clone()).collect();
        assert_eq!(labels, vec!["name", "feeders"]);
        let feeder = &root.children[1].children[0];
        assert_eq!(feeder.children.len(), 1);
        assert_eq!(feeder.children[0].value.as_deref(), Some("F1"));
    }
}
