//! Resolución hacia adelante: del `next_step` de un step a un índice destino.

use log::warn;
use serde::{Deserialize, Serialize};

use super::evaluate::evaluate;
use super::validate::{validate_branch_rule, RuleValidationError};
use crate::schema::NextStep;
use crate::state::WorkflowState;

/// How a target index was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Caller supplied the index (choice option, explicit override).
    Explicit,
    /// `next_step` is a plain integer.
    Fixed,
    /// The `if` entry at `entry` matched.
    Rule { entry: usize },
    /// No entry matched, `else.then` was used.
    Else,
    /// Nothing applied.
    Unresolved,
}

/// An `if` entry that failed validation and was left out of resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub entry: usize,
    pub error: RuleValidationError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchResolution {
    pub target: Option<i64>,
    pub route: Route,
    pub skipped: Vec<SkippedRule>,
}

impl BranchResolution {
    pub fn explicit(target: i64) -> Self {
        Self { target: Some(target),
               route: Route::Explicit,
               skipped: Vec::new() }
    }

    fn unresolved(skipped: Vec<SkippedRule>) -> Self {
        Self { target: None,
               route: Route::Unresolved,
               skipped }
    }
}

/// Resolves the next step index. Entries of a branch are tried in order and
/// the first one that validates and evaluates true wins. A negative result is
/// returned as-is; callers treat it as "stay".
pub fn resolve_next_step(next: Option<&NextStep>, state: &WorkflowState) -> BranchResolution {
    let spec = match next {
        None => return BranchResolution::unresolved(Vec::new()),
        Some(NextStep::Index(n)) => {
            return BranchResolution { target: Some(*n),
                                      route: Route::Fixed,
                                      skipped: Vec::new() }
        }
        Some(NextStep::Branch(spec)) => spec,
    };

    let mut skipped = Vec::new();
    for (entry, raw) in spec.rules.iter().enumerate() {
        let rule = match validate_branch_rule(raw) {
            Ok(rule) => rule,
            Err(error) => {
                warn!("skipping invalid branch rule #{entry}: {error}");
                skipped.push(SkippedRule { entry, error });
                continue;
            }
        };
        if evaluate(&rule.group, state) {
            return BranchResolution { target: Some(rule.then),
                                      route: Route::Rule { entry },
                                      skipped };
        }
    }

    match &spec.otherwise {
        Some(fallback) => BranchResolution { target: Some(fallback.then),
                                             route: Route::Else,
                                             skipped },
        None => BranchResolution::unresolved(skipped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn next(v: Value) -> NextStep {
        serde_json::from_value(v).expect("next_step fixture")
    }

    fn state(v: Value) -> WorkflowState {
        serde_json::from_value(v).expect("state fixture")
    }

    fn x_is_one_else_seven() -> NextStep {
        next(json!({
            "if": [{"condition": "OR", "rules": [{"field": "x", "operator": "eq", "value": 1}], "then": 2}],
            "else": {"then": 7}
        }))
    }

    #[test]
    fn matching_rule_wins() {
        let r = resolve_next_step(Some(&x_is_one_else_seven()), &state(json!({"x": 1})));
        assert_eq!(r.target, Some(2));
        assert_eq!(r.route, Route::Rule { entry: 0 });
    }

    #[test]
    fn else_when_nothing_matches() {
        let r = resolve_next_step(Some(&x_is_one_else_seven()), &state(json!({"x": 0})));
        assert_eq!(r.target, Some(7));
        assert_eq!(r.route, Route::Else);
    }

    #[test]
    fn first_match_wins() {
        let n = next(json!({"if": [
            {"condition": "AND", "rules": [], "then": 1},
            {"condition": "AND", "rules": [], "then": 2}
        ]}));
        assert_eq!(resolve_next_step(Some(&n), &WorkflowState::new()).target, Some(1));
    }

    #[test]
    fn fixed_index_ignores_state() {
        let n = next(json!(3));
        for s in [json!({}), json!({"x": 1}), json!({"anything": [1, 2]})] {
            let r = resolve_next_step(Some(&n), &state(s));
            assert_eq!(r.target, Some(3));
            assert_eq!(r.route, Route::Fixed);
        }
    }

    #[test]
    fn missing_next_step_is_unresolved() {
        let r = resolve_next_step(None, &WorkflowState::new());
        assert_eq!(r.target, None);
        assert_eq!(r.route, Route::Unresolved);
    }

    #[test]
    fn no_match_and_no_else_is_unresolved() {
        let n = next(json!({"if": [
            {"condition": "AND", "rules": [{"field": "x", "operator": "eq", "value": 1}], "then": 4}
        ]}));
        assert_eq!(resolve_next_step(Some(&n), &WorkflowState::new()).target, None);
    }

    #[test]
    fn invalid_entry_is_skipped_and_reported() {
        let n = next(json!({"if": [
            {"condition": "AND", "rules": [], "then": 1, "extra": true},
            {"condition": "AND", "rules": [], "then": 5}
        ]}));
        let r = resolve_next_step(Some(&n), &WorkflowState::new());
        assert_eq!(r.target, Some(5));
        assert_eq!(r.route, Route::Rule { entry: 1 });
        assert_eq!(r.skipped.len(), 1);
        assert_eq!(r.skipped[0].entry, 0);
    }
}
