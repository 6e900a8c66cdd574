//! Rule evaluation over in-memory transaction records.
//!
//! A pure, synchronous pass: no suspension, no shared mutable state.
//! Per-record failures (an operator outside the canonical set) skip that
//! record and continue; a malformed rule never aborts the whole pass.

use spendlens_core::{FieldValue, Transaction};
use tracing::warn;

use crate::schema::{Condition, ConditionSet, ConditionValue, Operator, Rule};

// ── Result types ────────────────────────────────────────────────────

/// Outcome of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Matching records, in input order.
    pub matched: Vec<Transaction>,
    pub total: usize,
    /// Records excluded because a condition could not be evaluated.
    pub skipped: usize,
}

/// Per-record outcome, kept internal so skip reasons stay reportable.
enum RecordOutcome {
    Match,
    NoMatch,
    Skip(String),
}

// ── Evaluator ───────────────────────────────────────────────────────

/// Evaluates a validated rule against a read-only record set.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluate `rule` against every record, returning the matching
    /// subset in input order. Never fails outward.
    pub fn evaluate(rule: &Rule, records: &[Transaction]) -> Evaluation {
        let mut matched = Vec::new();
        let mut skipped = 0usize;

        for (index, record) in records.iter().enumerate() {
            match evaluate_record(rule, record) {
                RecordOutcome::Match => matched.push(record.clone()),
                RecordOutcome::NoMatch => {}
                RecordOutcome::Skip(reason) => {
                    warn!(record = index, %reason, "skipping record");
                    skipped += 1;
                }
            }
        }

        Evaluation {
            matched,
            total: records.len(),
            skipped,
        }
    }
}

/// Short-circuiting group evaluation: `all` stops at the first false
/// condition, `any` at the first true one. A condition that cannot be
/// evaluated skips the record.
fn evaluate_record(rule: &Rule, record: &Transaction) -> RecordOutcome {
    match &rule.conditions {
        ConditionSet::All(conditions) => {
            for condition in conditions {
                match evaluate_condition(condition, record) {
                    Ok(true) => {}
                    Ok(false) => return RecordOutcome::NoMatch,
                    Err(reason) => return RecordOutcome::Skip(reason),
                }
            }
            RecordOutcome::Match
        }
        ConditionSet::Any(conditions) => {
            for condition in conditions {
                match evaluate_condition(condition, record) {
                    Ok(true) => return RecordOutcome::Match,
                    Ok(false) => {}
                    Err(reason) => return RecordOutcome::Skip(reason),
                }
            }
            RecordOutcome::NoMatch
        }
    }
}

fn evaluate_condition(condition: &Condition, record: &Transaction) -> Result<bool, String> {
    let operator: Operator = condition
        .operator
        .parse()
        .map_err(|_| format!("unrecognized operator '{}'", condition.operator))?;

    // Absent field → condition is false, never an error.
    let Some(value) = record.get(&condition.fact) else {
        return Ok(false);
    };

    Ok(match operator {
        Operator::LessThan => numeric_cmp(value, &condition.value, |a, b| a < b),
        Operator::GreaterThan => numeric_cmp(value, &condition.value, |a, b| a > b),
        Operator::LessThanInclusive => numeric_cmp(value, &condition.value, |a, b| a <= b),
        Operator::GreaterThanInclusive => numeric_cmp(value, &condition.value, |a, b| a >= b),
        Operator::Equal => strict_eq(value, &condition.value),
        Operator::NotEqual => !strict_eq(value, &condition.value),
        Operator::Contains => contains(value, &condition.value),
        Operator::In => is_member(value, &condition.value),
    })
}

// ── Operator semantics ──────────────────────────────────────────────

/// Ordering operators compare numerically; non-numeric operands on
/// either side compare false rather than raising.
fn numeric_cmp(value: &FieldValue, expected: &ConditionValue, cmp: fn(f64, f64) -> bool) -> bool {
    match (value.as_number(), expected.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Strict, type-sensitive equality: numeric 1 never equals text "1".
fn strict_eq(value: &FieldValue, expected: &ConditionValue) -> bool {
    match (value, expected) {
        (FieldValue::Number(a), ConditionValue::Number(b)) => a == b,
        (FieldValue::Text(a), ConditionValue::Text(b)) => a == b,
        _ => false,
    }
}

/// Substring containment over textual record values. Date fields render
/// as ISO-8601 text so "in 2020"-style conditions can match them.
fn contains(value: &FieldValue, expected: &ConditionValue) -> bool {
    match (value.as_text(), expected.as_text()) {
        (Some(haystack), Some(needle)) => haystack.contains(needle),
        _ => false,
    }
}

/// Membership of the record value inside the condition's sequence.
fn is_member(value: &FieldValue, expected: &ConditionValue) -> bool {
    match expected {
        ConditionValue::Sequence(items) => items.iter().any(|item| strict_eq(value, item)),
        _ => false,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
