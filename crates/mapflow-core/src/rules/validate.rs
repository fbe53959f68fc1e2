//! Recursive-descent validation of raw rule JSON into typed trees.

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{BranchRule, Condition, Operator, RuleGroup, RuleLeaf, RuleNode};

const ENTRY_KEYS: &[&str] = &["condition", "rules", "then"];
const GROUP_KEYS: &[&str] = &["condition", "rules"];
const LEAF_KEYS: &[&str] = &["field", "operator", "value"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("{path}: expected an object")]
    NotAnObject { path: String },
    #[error("{path}: missing required property '{key}'")]
    MissingProperty { path: String, key: &'static str },
    #[error("{path}: unexpected property '{key}'")]
    UnexpectedProperty { path: String, key: String },
    #[error("{path}: property '{key}' must be {expected}")]
    WrongType {
        path: String,
        key: &'static str,
        expected: &'static str,
    },
    #[error("{path}: unknown condition '{found}' (expected AND or OR)")]
    UnknownCondition { path: String, found: String },
}

/// Validates one top-level `if` entry (`{condition, rules, then}`).
pub fn validate_branch_rule(value: &Value) -> Result<BranchRule, RuleValidationError> {
    let path = "$";
    let map = as_object(value, path)?;
    check_keys(map, ENTRY_KEYS, path)?;
    let then = required(map, "then", path)?.as_i64()
                                            .ok_or_else(|| wrong_type(path, "then", "an integer"))?;
    let group = group_body(map, path)?;
    Ok(BranchRule { group, then })
}

/// Validates a standalone rule group (`{condition, rules}`).
pub fn validate_rule_group(value: &Value) -> Result<RuleGroup, RuleValidationError> {
    let path = "$";
    let map = as_object(value, path)?;
    check_keys(map, GROUP_KEYS, path)?;
    group_body(map, path)
}

fn node(value: &Value, path: &str) -> Result<RuleNode, RuleValidationError> {
    let map = as_object(value, path)?;
    if map.contains_key("condition") {
        check_keys(map, GROUP_KEYS, path)?;
        group_body(map, path).map(RuleNode::Group)
    } else {
        check_keys(map, LEAF_KEYS, path)?;
        leaf(map, path).map(RuleNode::Leaf)
    }
}

fn group_body(map: &Map<String, Value>, path: &str) -> Result<RuleGroup, RuleValidationError> {
    let raw = required(map, "condition", path)?.as_str()
                                                .ok_or_else(|| wrong_type(path, "condition", "a string"))?;
    let condition = Condition::parse(raw).ok_or_else(|| RuleValidationError::UnknownCondition { path: path.to_string(),
                                                                                               found: raw.to_string() })?;
    let items = required(map, "rules", path)?.as_array()
                                              .ok_or_else(|| wrong_type(path, "rules", "an array"))?;
    let rules = items.iter()
                     .enumerate()
                     .map(|(i, v)| node(v, &format!("{path}.rules[{i}]")))
                     .collect::<Result<Vec<_>, _>>()?;
    Ok(RuleGroup { condition, rules })
}

fn leaf(map: &Map<String, Value>, path: &str) -> Result<RuleLeaf, RuleValidationError> {
    let field = required(map, "field", path)?.as_str()
                                              .ok_or_else(|| wrong_type(path, "field", "a string"))?;
    let operator = required(map, "operator", path)?.as_str()
                                                    .ok_or_else(|| wrong_type(path, "operator", "a string"))?;
    let value = required(map, "value", path)?;
    Ok(RuleLeaf { field: field.to_string(),
                  operator: Operator::from(operator.to_string()),
                  value: value.clone() })
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, RuleValidationError> {
    value.as_object()
         .ok_or_else(|| RuleValidationError::NotAnObject { path: path.to_string() })
}

fn check_keys(map: &Map<String, Value>, allowed: &[&str], path: &str) -> Result<(), RuleValidationError> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(k) => Err(RuleValidationError::UnexpectedProperty { path: path.to_string(),
                                                                 key: k.clone() }),
        None => Ok(()),
    }
}

fn required<'a>(map: &'a Map<String, Value>,
                key: &'static str,
                path: &str)
                -> Result<&'a Value, RuleValidationError> {
    map.get(key)
       .ok_or_else(|| RuleValidationError::MissingProperty { path: path.to_string(),
                                                             key })
}

fn wrong_type(path: &str, key: &'static str, expected: &'static str) -> RuleValidationError {
    RuleValidationError::WrongType { path: path.to_string(),
                                     key,
                                     expected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_nested_groups() {
        let rule = validate_branch_rule(&json!({
            "condition": "OR",
            "rules": [
                {"field": "x", "operator": "eq", "value": 1},
                {"condition": "AND", "rules": [{"field": "y", "operator": "gt", "value": 2}]}
            ],
            "then": 4
        })).expect("valid");
        assert_eq!(rule.then, 4);
        assert_eq!(rule.group.condition, Condition::Or);
        assert!(matches!(rule.group.rules[1], RuleNode::Group(_)));
    }

    #[test]
    fn rejects_additional_properties() {
        let err = validate_branch_rule(&json!({
            "condition": "AND",
            "rules": [{"field": "x", "operator": "eq", "value": 1, "note": "?"}],
            "then": 1
        })).unwrap_err();
        assert_eq!(err,
                   RuleValidationError::UnexpectedProperty { path: "$.rules[0]".into(),
                                                             key: "note".into() });
    }

    #[test]
    fn rejects_missing_then_and_bad_condition() {
        let missing = validate_branch_rule(&json!({"condition": "AND", "rules": []})).unwrap_err();
        assert!(matches!(missing, RuleValidationError::MissingProperty { key: "then", .. }));

        let bad = validate_branch_rule(&json!({"condition": "XOR", "rules": [], "then": 1})).unwrap_err();
        assert!(matches!(bad, RuleValidationError::UnknownCondition { .. }));
    }

    #[test]
    fn leaf_requires_value_key() {
        let err = validate_rule_group(&json!({
            "condition": "AND",
            "rules": [{"field": "x", "operator": "eq"}]
        })).unwrap_err();
        assert!(matches!(err, RuleValidationError::MissingProperty { key: "value", .. }));
    }

    #[test]
    fn nested_group_may_not_carry_then() {
        let err = validate_rule_group(&json!({
            "condition": "AND",
            "rules": [{"condition": "OR", "rules": [], "then": 3}]
        })).unwrap_err();
        assert!(matches!(err, RuleValidationError::UnexpectedProperty { ref key, .. } if key == "then"));
    }

    #[test]
    fn unknown_operator_still_validates() {
        let group = validate_rule_group(&json!({
            "condition": "AND",
            "rules": [{"field": "x", "operator": "contains", "value": "a"}]
        })).expect("valid");
        match &group.rules[0] {
            RuleNode::Leaf(l) => assert_eq!(l.operator, Operator::Other("contains".into())),
            other => panic!("expected leaf, got {other:?}"),
        }
    }
}
