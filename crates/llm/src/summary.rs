//! Match-set summarization.
//!
//! Computes aggregate statistics over the matched records and asks the
//! backend for a short narrative, degrading to a deterministic template
//! when the call fails. This stage never fails outward.

use std::sync::Arc;

use spendlens_core::Transaction;
use tracing::{debug, warn};

use crate::provider::{LlmProvider, Message, Role, SamplingParams};

/// How many matched records to embed in the narrative prompt.
const SAMPLE_LIMIT: usize = 10;

pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    params: SamplingParams,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, params: SamplingParams) -> Self {
        Self { provider, params }
    }

    /// Summarize the match set. Empty matches short-circuit to a
    /// template without touching the backend; a backend failure degrades
    /// to the template as well.
    pub async fn summarize(&self, query: &str, matched: &[Transaction], total: usize) -> String {
        if matched.is_empty() {
            return format!(
                "No transactions out of {} matched your query \"{}\".",
                total, query
            );
        }

        let stats = AmountStats::compute(matched);
        match self.narrative(query, matched, total, stats.as_ref()).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "summary backend failed, falling back to template");
                fallback_template(query, matched.len(), total, stats.as_ref())
            }
        }
    }

    async fn narrative(
        &self,
        query: &str,
        matched: &[Transaction],
        total: usize,
        stats: Option<&AmountStats>,
    ) -> Result<String, crate::provider::LlmError> {
        let sample: Vec<&Transaction> = matched.iter().take(SAMPLE_LIMIT).collect();
        let sample_json = serde_json::to_string(&sample).unwrap_or_default();

        let stats_block = match stats {
            Some(s) => format!(
                "Smallest amount: ${:.2} ({})\nLargest amount: ${:.2} ({})\nAverage amount: ${:.2}",
                s.min,
                s.min_context,
                s.max,
                s.max_context,
                s.mean
            ),
            None => "No amount statistics available.".to_string(),
        };

        let prompt = format!(
            "The user asked about credit-card transactions: \"{}\"\n\n\
             {} of {} transactions matched ({:.1}%).\n{}\n\n\
             Sample of matched transactions (up to {}):\n{}\n\n\
             Write a concise 2-3 sentence summary of these results in plain language. \
             Mention the match count and the notable amounts. No lists, no preamble.",
            query,
            matched.len(),
            total,
            percentage(matched.len(), total),
            stats_block,
            SAMPLE_LIMIT,
            sample_json
        );

        debug!("Summary prompt built ({} chars)", prompt.len());

        let messages = vec![Message {
            role: Role::User,
            content: prompt,
        }];
        self.provider.complete(messages, self.params).await
    }
}

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

fn fallback_template(query: &str, count: usize, total: usize, stats: Option<&AmountStats>) -> String {
    match stats {
        Some(s) => format!(
            "Found {} of {} transactions ({:.1}%) matching \"{}\". \
             Amounts range from ${:.2} ({}) to ${:.2} ({}), averaging ${:.2}.",
            count,
            total,
            percentage(count, total),
            query,
            s.min,
            s.min_context,
            s.max,
            s.max_context,
            s.mean
        ),
        None => format!(
            "Found {} of {} transactions ({:.1}%) matching \"{}\".",
            count,
            total,
            percentage(count, total),
            query
        ),
    }
}

// ── Amount statistics ───────────────────────────────────────────────

/// Extremes and mean of the matched amounts, with merchant/date context
/// for the extreme records (first occurrence wins ties).
#[derive(Debug, Clone)]
pub struct AmountStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub min_context: String,
    pub max_context: String,
}

impl AmountStats {
    pub fn compute(matched: &[Transaction]) -> Option<Self> {
        let mut min: Option<(f64, &Transaction)> = None;
        let mut max: Option<(f64, &Transaction)> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for record in matched {
            let Some(amt) = record.get("amt").and_then(|v| v.as_number()) else {
                continue;
            };
            sum += amt;
            count += 1;
            // Strict comparisons keep the first occurrence on ties.
            if min.map_or(true, |(m, _)| amt < m) {
                min = Some((amt, record));
            }
            if max.map_or(true, |(m, _)| amt > m) {
                max = Some((amt, record));
            }
        }

        let (min_amt, min_record) = min?;
        let (max_amt, max_record) = max?;
        Some(Self {
            min: min_amt,
            max: max_amt,
            mean: sum / count as f64,
            min_context: record_context(min_record),
            max_context: record_context(max_record),
        })
    }
}

/// "merchant on date" context line for an extreme record.
fn record_context(record: &Transaction) -> String {
    let merchant = record
        .get("merchant")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown merchant".to_string());
    match record.get("date") {
        Some(date) => format!("{} on {}", merchant, date),
        None => merchant,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LlmError;
    use async_trait::async_trait;
    use spendlens_core::FieldValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _params: SamplingParams,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LlmError::ApiError {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok("A tidy narrative.".to_string())
            }
        }
    }

    fn tx(merchant: &str, amt: f64) -> Transaction {
        [
            ("merchant".to_string(), FieldValue::Text(merchant.into())),
            ("amt".to_string(), FieldValue::Number(amt)),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn empty_matches_skip_the_backend() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let summarizer = Summarizer::new(provider.clone(), SamplingParams::warm(256));
        let text = summarizer.summarize("big spends", &[], 42).await;
        assert!(text.contains("No transactions"));
        assert!(text.contains("42"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_narrative_is_used_on_success() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let summarizer = Summarizer::new(provider.clone(), SamplingParams::warm(256));
        let text = summarizer
            .summarize("coffee", &[tx("Starbucks", 4.85)], 10)
            .await;
        assert_eq!(text, "A tidy narrative.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_template() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let summarizer = Summarizer::new(provider.clone(), SamplingParams::warm(256));
        let matched = vec![tx("Starbucks", 4.85), tx("Amazon", 120.0)];
        let text = summarizer.summarize("purchases", &matched, 4).await;
        assert!(text.contains("Found 2 of 4"));
        assert!(text.contains("$4.85"));
        assert!(text.contains("$120.00"));
        assert!(text.contains("50.0%"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stats_first_occurrence_wins_ties() {
        let matched = vec![tx("First", 5.0), tx("Second", 5.0)];
        let stats = AmountStats::compute(&matched).unwrap();
        assert!(stats.min_context.contains("First"));
        assert!(stats.max_context.contains("First"));
    }

    #[test]
    fn stats_mean_is_arithmetic() {
        let matched = vec![tx("A", 10.0), tx("B", 20.0), tx("C", 60.0)];
        let stats = AmountStats::compute(&matched).unwrap();
        assert_eq!(stats.mean, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 60.0);
    }

    #[test]
    fn stats_without_amounts_is_none() {
        let matched = vec![[("merchant".to_string(), FieldValue::Text("X".into()))]
            .into_iter()
            .collect::<Transaction>()];
        assert!(AmountStats::compute(&matched).is_none());
    }

    #[test]
    fn percentage_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
