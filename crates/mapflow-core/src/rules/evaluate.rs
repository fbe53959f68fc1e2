//! Evaluación pura de árboles de reglas ya validados.

use log::debug;
use serde_json::Value;
use std::cmp::Ordering;

use super::types::{Condition, Operator, RuleGroup, RuleLeaf, RuleNode};
use crate::state::WorkflowState;

/// Evaluates a group against `state`. Deterministic: no side effects, no
/// dependence on anything but the arguments.
pub fn evaluate(group: &RuleGroup, state: &WorkflowState) -> bool {
    match group.condition {
        Condition::And => group.rules.iter().all(|r| evaluate_node(r, state)),
        Condition::Or => group.rules.iter().any(|r| evaluate_node(r, state)),
    }
}

pub fn evaluate_node(node: &RuleNode, state: &WorkflowState) -> bool {
    match node {
        RuleNode::Group(g) => evaluate(g, state),
        RuleNode::Leaf(l) => evaluate_leaf(l, state),
    }
}

fn evaluate_leaf(leaf: &RuleLeaf, state: &WorkflowState) -> bool {
    let actual = state.get(&leaf.field);
    match &leaf.operator {
        Operator::Eq => strict_eq(actual, &leaf.value),
        Operator::Neq => !strict_eq(actual, &leaf.value),
        Operator::Gt => compare(actual, &leaf.value) == Some(Ordering::Greater),
        Operator::Lt => compare(actual, &leaf.value) == Some(Ordering::Less),
        Operator::Gte => matches!(compare(actual, &leaf.value), Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lte => matches!(compare(actual, &leaf.value), Some(Ordering::Less | Ordering::Equal)),
        Operator::Other(op) => {
            debug!("unknown rule operator '{op}' on field '{}', evaluating to false", leaf.field);
            false
        }
    }
}

/// Type-strict equality. Numbers compare by value regardless of their integer
/// or float representation; a missing field equals nothing.
fn strict_eq(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, _) => false,
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Some(a), b) => a == b,
    }
}

/// Ordinal comparison. Strings compare lexicographically with strings; in any
/// other pairing both sides must read as numbers (numeric strings included).
fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    if let (Value::String(a), Value::String(b)) = (actual, expected) {
        return Some(a.cmp(b));
    }
    as_number(actual)?.partial_cmp(&as_number(expected)?)
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::validate_rule_group;
    use serde_json::json;

    fn state(v: Value) -> WorkflowState {
        match v {
            Value::Object(m) => WorkflowState::from(m),
            _ => unreachable!(),
        }
    }

    fn adult_in_nl() -> RuleGroup {
        validate_rule_group(&json!({
            "condition": "AND",
            "rules": [
                {"field": "age", "operator": "gte", "value": 18},
                {"field": "country", "operator": "eq", "value": "NL"}
            ]
        })).expect("valid rule")
    }

    #[test]
    fn and_rule_true_when_all_hold() {
        assert!(evaluate(&adult_in_nl(), &state(json!({"age": 20, "country": "NL"}))));
    }

    #[test]
    fn and_rule_false_when_one_fails() {
        assert!(!evaluate(&adult_in_nl(), &state(json!({"age": 16, "country": "NL"}))));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let rule = adult_in_nl();
        let s = state(json!({"age": 18, "country": "NL"}));
        let first = evaluate(&rule, &s);
        assert!((0..10).all(|_| evaluate(&rule, &s) == first));
    }

    #[test]
    fn or_rule_and_nested_groups() {
        let rule = validate_rule_group(&json!({
            "condition": "OR",
            "rules": [
                {"field": "carrier", "operator": "eq", "value": "heat"},
                {"condition": "AND", "rules": [
                    {"field": "capacity", "operator": "gt", "value": 10},
                    {"field": "capacity", "operator": "lte", "value": 50}
                ]}
            ]
        })).unwrap();
        assert!(evaluate(&rule, &state(json!({"carrier": "heat"}))));
        assert!(evaluate(&rule, &state(json!({"carrier": "gas", "capacity": 50}))));
        assert!(!evaluate(&rule, &state(json!({"carrier": "gas", "capacity": 51}))));
    }

    #[test]
    fn equality_is_type_strict_but_numeric_repr_agnostic() {
        let rule = validate_rule_group(&json!({
            "condition": "AND", "rules": [{"field": "x", "operator": "eq", "value": 1}]
        })).unwrap();
        assert!(evaluate(&rule, &state(json!({"x": 1.0}))));
        assert!(!evaluate(&rule, &state(json!({"x": "1"}))));
        assert!(!evaluate(&rule, &state(json!({}))));
    }

    #[test]
    fn neq_holds_for_missing_field() {
        let rule = validate_rule_group(&json!({
            "condition": "AND", "rules": [{"field": "x", "operator": "neq", "value": 1}]
        })).unwrap();
        assert!(evaluate(&rule, &state(json!({}))));
    }

    #[test]
    fn ordering_reads_numeric_strings() {
        let rule = validate_rule_group(&json!({
            "condition": "AND", "rules": [{"field": "age", "operator": "gt", "value": 17}]
        })).unwrap();
        assert!(evaluate(&rule, &state(json!({"age": "18"}))));
        assert!(!evaluate(&rule, &state(json!({"age": "old"}))));
        assert!(!evaluate(&rule, &state(json!({"age": null}))));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let rule = validate_rule_group(&json!({
            "condition": "OR", "rules": [{"field": "x", "operator": "like", "value": "a"}]
        })).unwrap();
        assert!(!evaluate(&rule, &state(json!({"x": "a"}))));
    }
}
