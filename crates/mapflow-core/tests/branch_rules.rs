use mapflow_core::rules::{evaluate, resolve_next_step, validate_rule_group, Route};
use mapflow_core::{NextStep, WorkflowState};
use serde_json::{json, Value};

fn state(v: Value) -> WorkflowState {
    serde_json::from_value(v).unwrap()
}

fn next(v: Value) -> NextStep {
    serde_json::from_value(v).unwrap()
}

#[test]
fn adult_dutch_user() {
    let rule = validate_rule_group(&json!({
        "condition": "AND",
        "rules": [
            {"field": "age", "operator": "gte", "value": 18},
            {"field": "country", "operator": "eq", "value": "NL"}
        ]
    })).unwrap();
    assert!(evaluate(&rule, &state(json!({"age": 20, "country": "NL"}))));
    assert!(!evaluate(&rule, &state(json!({"age": 16, "country": "NL"}))));
}

#[test]
fn or_rule_then_else() {
    let n = next(json!({
        "if": [{"condition": "OR", "rules": [{"field": "x", "operator": "eq", "value": 1}], "then": 2}],
        "else": {"then": 7}
    }));
    assert_eq!(resolve_next_step(Some(&n), &state(json!({"x": 1}))).target, Some(2));
    assert_eq!(resolve_next_step(Some(&n), &state(json!({"x": 0}))).target, Some(7));
}

#[test]
fn leaf_fields_are_exact_keys() {
    let rule = validate_rule_group(&json!({
        "condition": "AND", "rules": [{"field": "area.kind", "operator": "eq", "value": "urban"}]
    })).unwrap();
    assert!(!evaluate(&rule, &state(json!({"area": {"kind": "urban"}}))));
    assert!(evaluate(&rule, &state(json!({"area.kind": "urban"}))));
}

#[test]
fn every_entry_invalid_falls_through_to_else() {
    let n = next(json!({
        "if": [
            {"condition": "AND", "rules": [{"field": "x"}], "then": 1},
            {"rules": [], "then": 2},
            "not even an object"
        ],
        "else": {"then": 0}
    }));
    let r = resolve_next_step(Some(&n), &WorkflowState::new());
    assert_eq!(r.target, Some(0));
    assert_eq!(r.route, Route::Else);
    assert_eq!(r.skipped.iter().map(|s| s.entry).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn deeply_nested_groups() {
    let rule = validate_rule_group(&json!({
        "condition": "AND",
        "rules": [
            {"condition": "OR", "rules": [
                {"field": "carrier", "operator": "eq", "value": "heat"},
                {"condition": "AND", "rules": [
                    {"field": "carrier", "operator": "eq", "value": "gas"},
                    {"field": "pressure", "operator": "lt", "value": 8}
                ]}
            ]},
            {"field": "year", "operator": "lte", "value": 2050}
        ]
    })).unwrap();
    assert!(evaluate(&rule, &state(json!({"carrier": "gas", "pressure": 4, "year": 2030}))));
    assert!(!evaluate(&rule, &state(json!({"carrier": "gas", "pressure": 9, "year": 2030}))));
    assert!(!evaluate(&rule, &state(json!({"carrier": "heat", "year": 2060}))));
}
