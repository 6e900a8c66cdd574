//! End-to-end query processing: generate → evaluate → summarize.
//!
//! Stage-fatal failures (rule generation) abort the query and come back
//! as a structured failure outcome; evaluation and summary failures are
//! contained within their stages. Nothing is cached across calls — each
//! query triggers a fresh generation and evaluation pass.

use std::sync::Arc;

use serde::Serialize;
use spendlens_catalog::FieldCatalog;
use spendlens_core::Transaction;
use spendlens_rules::{Rule, RuleEvaluator};
use tracing::info;

use crate::generator::RuleGenerator;
use crate::provider::{LlmProvider, SamplingParams};
use crate::summary::{percentage, Summarizer};

/// Static phrasing hint attached to generation failures.
pub const HELP_MESSAGE: &str = "Try queries like: \"show transactions over $500\", \
\"fraudulent transactions in TX\", or \"coffee purchases under $10\".";

/// The caller-facing result contract: a tagged success/failure shape any
/// front end can render or re-serialize.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Success(QuerySuccess),
    Failure(QueryFailure),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySuccess {
    pub success: bool,
    pub query: String,
    pub generated_rule: Rule,
    pub matched_transactions: Vec<Transaction>,
    pub results: MatchStats,
    pub summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub match_count: usize,
    pub total_transactions: usize,
    /// Percentage of records matched, one decimal place.
    pub match_percentage: f64,
    /// Records excluded because a condition could not be evaluated.
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Sequences generator → evaluator → summarizer over a read-only record
/// set. One query at a time; the two backend calls are the only points
/// of suspension.
pub struct QueryPipeline {
    generator: RuleGenerator,
    summarizer: Summarizer,
    catalog: FieldCatalog,
    records: Vec<Transaction>,
}

impl QueryPipeline {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        catalog: FieldCatalog,
        records: Vec<Transaction>,
        rule_params: SamplingParams,
        summary_params: SamplingParams,
    ) -> Self {
        Self {
            generator: RuleGenerator::new(provider.clone(), rule_params),
            summarizer: Summarizer::new(provider, summary_params),
            catalog,
            records,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Process one query end to end. Never panics or propagates an
    /// error past this boundary.
    pub async fn process(&self, query: &str) -> QueryOutcome {
        let rule = match self.generator.generate(query, &self.catalog).await {
            Ok(rule) => rule,
            Err(e) => {
                return QueryOutcome::Failure(QueryFailure {
                    success: false,
                    error: e.to_string(),
                    help_message: Some(HELP_MESSAGE.to_string()),
                });
            }
        };

        let evaluation = RuleEvaluator::evaluate(&rule, &self.records);
        info!(
            matched = evaluation.matched.len(),
            total = evaluation.total,
            skipped = evaluation.skipped,
            "Evaluation complete"
        );

        let summary = self
            .summarizer
            .summarize(query, &evaluation.matched, evaluation.total)
            .await;

        QueryOutcome::Success(QuerySuccess {
            success: true,
            query: query.to_string(),
            results: MatchStats {
                match_count: evaluation.matched.len(),
                total_transactions: evaluation.total,
                match_percentage: percentage(evaluation.matched.len(), evaluation.total),
                skipped: evaluation.skipped,
            },
            generated_rule: rule,
            matched_transactions: evaluation.matched,
            summary,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
