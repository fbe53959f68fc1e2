use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `next_step` of a step definition.
///
/// Branch entries stay raw JSON until resolution: an entry that does not match
/// the rule grammar is skipped then, it does not make the whole step
/// unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextStep {
    Index(i64),
    Branch(BranchSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchSpec {
    #[serde(rename = "if", default)]
    pub rules: Vec<Value>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<ElseTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElseTarget {
    pub then: i64,
}

impl NextStep {
    pub fn fixed(index: i64) -> Self {
        NextStep::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_and_object_forms() {
        let fixed: NextStep = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(fixed, NextStep::Index(3));

        let branch: NextStep = serde_json::from_value(json!({"if": [], "else": {"then": 1}})).unwrap();
        match branch {
            NextStep::Branch(spec) => {
                assert!(spec.rules.is_empty());
                assert_eq!(spec.otherwise, Some(ElseTarget { then: 1 }));
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }
}
