//! JSON wire schema for filter rules.
//!
//! The shape is the external contract: any consumer applying these rules
//! elsewhere must accept exactly `conditions.{all|any}[]`, `event.type`,
//! and `event.params.message`, plus the eight canonical operator symbols.

use serde::{Deserialize, Serialize};

/// A validated, immutable filter rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: ConditionSet,
    pub event: RuleEvent,
}

/// The single-level condition group. External serde tagging enforces
/// exactly one of `all`/`any` at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionSet {
    /// Logical AND across conditions.
    All(Vec<Condition>),
    /// Logical OR across conditions.
    Any(Vec<Condition>),
}

impl ConditionSet {
    pub fn conditions(&self) -> &[Condition] {
        match self {
            ConditionSet::All(c) | ConditionSet::Any(c) => c,
        }
    }
}

/// One atomic comparison inside a condition group.
///
/// `operator` stays a raw string here: rules arriving over the wire may
/// carry symbols outside the canonical set, and those fail per-record at
/// evaluation rather than poisoning deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub fact: String,
    pub operator: String,
    pub value: ConditionValue,
}

/// Tagged condition value. JSON null, bool, and nested objects are not
/// representable and get rejected by structural validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    Sequence(Vec<ConditionValue>),
}

impl ConditionValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConditionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConditionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Descriptive event attached to a rule, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub params: EventParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    pub message: String,
}

// ── Canonical operators ─────────────────────────────────────────────

/// The eight canonical comparison operators. Closed set: generated rules
/// may not introduce new symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
    LessThanInclusive,
    GreaterThanInclusive,
    Contains,
    In,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessThanInclusive,
        Operator::GreaterThanInclusive,
        Operator::Contains,
        Operator::In,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::LessThan => "lessThan",
            Operator::GreaterThan => "greaterThan",
            Operator::Equal => "equal",
            Operator::NotEqual => "notEqual",
            Operator::LessThanInclusive => "lessThanInclusive",
            Operator::GreaterThanInclusive => "greaterThanInclusive",
            Operator::Contains => "contains",
            Operator::In => "in",
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or(())
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule_json() -> &'static str {
        r#"{
            "conditions": {
                "all": [
                    { "fact": "amt", "operator": "greaterThan", "value": 100 },
                    { "fact": "merchant", "operator": "contains", "value": "Coffee" }
                ]
            },
            "event": {
                "type": "transaction-match",
                "params": { "message": "coffee purchases over $100" }
            }
        }"#
    }

    #[test]
    fn deserialize_all_group() {
        let rule: Rule = serde_json::from_str(sample_rule_json()).unwrap();
        match &rule.conditions {
            ConditionSet::All(conds) => {
                assert_eq!(conds.len(), 2);
                assert_eq!(conds[0].fact, "amt");
                assert_eq!(conds[0].value, ConditionValue::Number(100.0));
                assert_eq!(conds[1].value, ConditionValue::Text("Coffee".into()));
            }
            ConditionSet::Any(_) => panic!("expected all group"),
        }
        assert_eq!(rule.event.kind, "transaction-match");
    }

    #[test]
    fn deserialize_any_group() {
        let json = r#"{
            "conditions": { "any": [ { "fact": "state", "operator": "in", "value": ["TX", "CA"] } ] },
            "event": { "type": "t", "params": { "message": "m" } }
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        match &rule.conditions {
            ConditionSet::Any(conds) => match &conds[0].value {
                ConditionValue::Sequence(items) => assert_eq!(items.len(), 2),
                other => panic!("expected sequence, got {:?}", other),
            },
            ConditionSet::All(_) => panic!("expected any group"),
        }
    }

    #[test]
    fn reject_missing_group() {
        let json = r#"{
            "conditions": {},
            "event": { "type": "t", "params": { "message": "m" } }
        }"#;
        assert!(serde_json::from_str::<Rule>(json).is_err());
    }

    #[test]
    fn reject_both_groups() {
        let json = r#"{
            "conditions": { "all": [], "any": [] },
            "event": { "type": "t", "params": { "message": "m" } }
        }"#;
        assert!(serde_json::from_str::<Rule>(json).is_err());
    }

    #[test]
    fn serde_round_trip_preserves_rule() {
        let rule: Rule = serde_json::from_str(sample_rule_json()).unwrap();
        let json = serde_json::to_string(&rule).unwrap();
        let back: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn wire_shape_uses_lowercase_group_key() {
        let rule: Rule = serde_json::from_str(sample_rule_json()).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert!(value["conditions"]["all"].is_array());
        assert_eq!(value["event"]["type"], "transaction-match");
    }

    #[test]
    fn operator_from_str_closed_set() {
        assert_eq!("lessThan".parse::<Operator>(), Ok(Operator::LessThan));
        assert_eq!(
            "greaterThanInclusive".parse::<Operator>(),
            Ok(Operator::GreaterThanInclusive)
        );
        assert!("startsWith".parse::<Operator>().is_err());
        assert!("LESSTHAN".parse::<Operator>().is_err());
    }
}
