//! Structural validation of generated rules with path-addressed errors.
//!
//! Validates a parsed JSON value against the rule invariants before it is
//! deserialized into a [`Rule`](crate::schema::Rule): presence of
//! `conditions` and `event`, exactly one non-empty `all`/`any` group, and
//! `fact`/`operator`/`value` on every condition. Returns a
//! [`ValidationResult`] with errors (reject the rule) and warnings
//! (advisory).

use serde_json::Value;
use spendlens_catalog::FieldCatalog;

use crate::schema::Operator;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"conditions.all[1].operator"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// One-line rendering of all blocking errors, for error messages.
    pub fn describe_errors(&self) -> String {
        self.errors
            .iter()
            .map(|e| {
                let loc = if e.path.is_empty() {
                    String::new()
                } else {
                    format!("{}: ", e.path)
                };
                match &e.suggestion {
                    Some(s) => format!("{}{} (did you mean '{}'?)", loc, e.message, s),
                    None => format!("{}{}", loc, e.message),
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed JSON value against the rule invariants.
pub fn validate_value(value: &Value, catalog: &FieldCatalog) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(root) = value.as_object() else {
        result.error("", "rule must be a JSON object");
        return result;
    };

    match root.get("conditions") {
        Some(conditions) => validate_conditions(conditions, catalog, &mut result),
        None => result.error("conditions", "missing required key 'conditions'"),
    }

    match root.get("event") {
        Some(event) => validate_event(event, &mut result),
        None => result.error("event", "missing required key 'event'"),
    }

    result
}

// ── Condition group ─────────────────────────────────────────────────

fn validate_conditions(conditions: &Value, catalog: &FieldCatalog, result: &mut ValidationResult) {
    let Some(group) = conditions.as_object() else {
        result.error("conditions", "'conditions' must be an object");
        return;
    };

    let has_all = group.contains_key("all");
    let has_any = group.contains_key("any");
    match (has_all, has_any) {
        (true, true) => {
            result.error("conditions", "exactly one of 'all'/'any' allowed, found both");
            return;
        }
        (false, false) => {
            result.error("conditions", "must contain exactly one of 'all' or 'any'");
            return;
        }
        _ => {}
    }

    let key = if has_all { "all" } else { "any" };
    let path = format!("conditions.{}", key);

    let Some(items) = group[key].as_array() else {
        result.error(path, format!("'{}' must be an array of conditions", key));
        return;
    };
    if items.is_empty() {
        result.error(path, format!("'{}' must not be empty", key));
        return;
    }

    for (i, item) in items.iter().enumerate() {
        validate_condition(item, &format!("{}[{}]", path, i), catalog, result);
    }
}

fn validate_condition(
    condition: &Value,
    path: &str,
    catalog: &FieldCatalog,
    result: &mut ValidationResult,
) {
    let Some(obj) = condition.as_object() else {
        result.error(path, "condition must be an object");
        return;
    };

    // fact
    match obj.get("fact").and_then(Value::as_str) {
        Some(fact) => {
            if catalog.resolve_field(fact) != Some(fact) {
                // Unknown facts evaluate false per record rather than
                // failing the rule, so this is advisory.
                match catalog.suggest_field(fact) {
                    Some(name) => result.warn(
                        format!("{}.fact", path),
                        format!("'{}' is not a catalog field (closest: '{}')", fact, name),
                    ),
                    None => result.warn(
                        format!("{}.fact", path),
                        format!("'{}' is not a catalog field", fact),
                    ),
                }
            }
        }
        None => result.error(format!("{}.fact", path), "missing string key 'fact'"),
    }

    // operator: closed set of eight canonical symbols
    match obj.get("operator").and_then(Value::as_str) {
        Some(op) => {
            if op.parse::<Operator>().is_err() {
                let resolved = catalog.resolve_operator(op);
                if resolved != op {
                    result.error_with_suggestion(
                        format!("{}.operator", path),
                        format!("unrecognized operator '{}'", op),
                        resolved,
                    );
                } else {
                    result.error(
                        format!("{}.operator", path),
                        format!("unrecognized operator '{}'", op),
                    );
                }
            }
        }
        None => result.error(format!("{}.operator", path), "missing string key 'operator'"),
    }

    // value: must be present and a string, number, or array
    match obj.get("value") {
        Some(Value::String(_)) | Some(Value::Number(_)) => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !matches!(item, Value::String(_) | Value::Number(_)) {
                    result.error(
                        format!("{}.value[{}]", path, i),
                        "sequence elements must be strings or numbers",
                    );
                }
            }
        }
        Some(_) => result.error(
            format!("{}.value", path),
            "'value' must be a string, number, or array",
        ),
        None => result.error(format!("{}.value", path), "missing key 'value'"),
    }
}

// ── Event ───────────────────────────────────────────────────────────

fn validate_event(event: &Value, result: &mut ValidationResult) {
    let Some(obj) = event.as_object() else {
        result.error("event", "'event' must be an object");
        return;
    };

    if obj.get("type").and_then(Value::as_str).is_none() {
        result.error("event.type", "missing string key 'type'");
    }

    match obj.get("params").and_then(Value::as_object) {
        Some(params) => {
            if params.get("message").and_then(Value::as_str).is_none() {
                result.error("event.params.message", "missing string key 'message'");
            }
        }
        None => result.error("event.params", "missing object key 'params'"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::transactions()
    }

    fn valid_rule() -> Value {
        json!({
            "conditions": {
                "all": [ { "fact": "amt", "operator": "lessThan", "value": 10 } ]
            },
            "event": { "type": "transaction-match", "params": { "message": "cheap" } }
        })
    }

    #[test]
    fn accepts_valid_rule() {
        let result = validate_value(&valid_rule(), &catalog());
        assert!(result.valid, "errors: {}", result.describe_errors());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn round_trip_revalidates() {
        let rule: crate::schema::Rule = serde_json::from_value(valid_rule()).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert!(validate_value(&value, &catalog()).valid);
    }

    #[test]
    fn rejects_non_object() {
        let result = validate_value(&json!([1, 2]), &catalog());
        assert!(!result.valid);
    }

    #[test]
    fn rejects_missing_event() {
        let mut value = valid_rule();
        value.as_object_mut().unwrap().remove("event");
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "event");
    }

    #[test]
    fn rejects_empty_group() {
        let value = json!({
            "conditions": { "all": [] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
        assert!(result.errors[0].message.contains("must not be empty"));
    }

    #[test]
    fn rejects_both_groups() {
        let value = json!({
            "conditions": { "all": [], "any": [] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
        assert!(result.errors[0].message.contains("found both"));
    }

    #[test]
    fn rejects_unknown_operator_with_suggestion() {
        let value = json!({
            "conditions": { "all": [ { "fact": "amt", "operator": "gte", "value": 5 } ] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("greaterThanInclusive")
        );
    }

    #[test]
    fn rejects_undefined_value() {
        let value = json!({
            "conditions": { "all": [ { "fact": "amt", "operator": "lessThan" } ] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
        assert!(result.errors[0].path.ends_with(".value"));
    }

    #[test]
    fn rejects_null_value() {
        let value = json!({
            "conditions": { "all": [ { "fact": "amt", "operator": "equal", "value": null } ] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(!result.valid);
    }

    #[test]
    fn unknown_fact_is_advisory() {
        let value = json!({
            "conditions": { "all": [ { "fact": "colour", "operator": "equal", "value": "red" } ] },
            "event": { "type": "t", "params": { "message": "m" } }
        });
        let result = validate_value(&value, &catalog());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }
}
