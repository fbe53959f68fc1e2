use std::path::PathBuf;

use mapflow_cli::{run, Command};
use serde_json::{json, Value};
use uuid::Uuid;

fn write_catalog(v: &Value) -> PathBuf {
    let path = std::env::temp_dir().join(format!("mapflow-cli-{}.json", Uuid::new_v4()));
    std::fs::write(&path, serde_json::to_string(v).unwrap()).unwrap();
    path
}

fn catalog() -> Value {
    json!({"services": [{
        "name": "District heating",
        "workflow": [
            {"type": "form", "name": "ask", "fields": [{"name": "buildings", "type": "integer"}],
             "next_step": {"if": [
                 {"condition": "XOR", "rules": [], "then": 1},
                 {"condition": "AND", "rules": [{"field": "buildings", "operator": "gt", "value": 10}], "then": 1}
             ], "else": {"then": 2}}},
            {"type": "text", "name": "large network"},
            {"type": "text", "name": "single building"}
        ]
    }]})
}

#[test]
fn validate_reports_warnings_but_accepts() {
    let path = write_catalog(&catalog());
    let lines = run(Command::Validate { file: path.clone() }).unwrap();
    assert!(lines[0].starts_with("[0] District heating: ok (3 steps, 1 warning(s))"));
    std::fs::remove_file(path).ok();
}

#[test]
fn validate_rejects_out_of_range_targets() {
    let bad = json!([{"name": "broken", "workflow": [{"type": "text", "name": "a", "next_step": 9}]}]);
    let path = write_catalog(&bad);
    let err = run(Command::Validate { file: path.clone() }).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().contains("broken: invalid"));
    std::fs::remove_file(path).ok();
}

#[test]
fn resolve_follows_rules_then_else() {
    let path = write_catalog(&catalog());
    let out = run(Command::Resolve { file: path.clone(),
                                     service: 0,
                                     step: 0,
                                     state: r#"{"buildings": 12}"#.into() }).unwrap();
    let v: Value = serde_json::from_str(&out[0]).unwrap();
    assert_eq!(v["target"], json!(1));
    assert_eq!(v["target_name"], json!("large network"));
    assert_eq!(v["route"], json!({"rule": 1}));
    assert_eq!(v["skipped"][0]["entry"], json!(0));

    let out = run(Command::Resolve { file: path.clone(),
                                     service: 0,
                                     step: 0,
                                     state: r#"{"buildings": 3}"#.into() }).unwrap();
    let v: Value = serde_json::from_str(&out[0]).unwrap();
    assert_eq!(v["target"], json!(2));
    assert_eq!(v["route"], json!("else"));

    let err = run(Command::Resolve { file: path.clone(),
                                     service: 0,
                                     step: 7,
                                     state: "{}".into() }).unwrap_err();
    assert_eq!(err.exit_code(), 4);
    std::fs::remove_file(path).ok();
}
