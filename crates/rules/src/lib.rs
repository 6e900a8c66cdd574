//! Filter-rule engine for transaction queries.
//!
//! This crate provides:
//! - The JSON wire schema for rules (`conditions.{all|any}[]`, `event`)
//!   with serde deserialization
//! - Structural validation with path-addressed errors and suggestions
//! - A record evaluator with per-record failure tolerance

pub mod evaluator;
pub mod schema;
pub mod validation;

pub use evaluator::{Evaluation, RuleEvaluator};
pub use schema::{Condition, ConditionSet, ConditionValue, Operator, Rule, RuleEvent};
pub use validation::{validate_value, ValidationResult};
