//! Backend-assisted rule generation.
//!
//! Builds a generation prompt from the field catalog and the user's
//! query, requests a single cold-sampled completion, extracts the JSON
//! rule from the raw response, and validates its shape. Exactly one
//! outbound request per call; retry policy belongs to the caller.

use std::sync::Arc;

use spendlens_catalog::FieldCatalog;
use spendlens_rules::{validation, Rule};
use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message, Role, SamplingParams};

/// Embedded system prompt template for rule generation.
const RULE_TEMPLATE: &str = include_str!("../prompts/rule-generation.md");

/// Placeholder in the template that gets replaced with the field table.
const CATALOG_PLACEHOLDER: &str = "<<<catalog>>>";

/// Converts natural-language questions into validated filter rules.
pub struct RuleGenerator {
    provider: Arc<dyn LlmProvider>,
    params: SamplingParams,
}

impl RuleGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, params: SamplingParams) -> Self {
        Self { provider, params }
    }

    /// Generate a rule for `query`. One backend request; a transport or
    /// status failure is surfaced, never downgraded to a default rule.
    pub async fn generate(
        &self,
        query: &str,
        catalog: &FieldCatalog,
    ) -> Result<Rule, GenerationError> {
        let system_prompt =
            RULE_TEMPLATE.replace(CATALOG_PLACEHOLDER, &catalog.to_prompt_section());
        let user_prompt = format!(
            "Convert this question to a filter rule:\n\n{}\n\nRespond ONLY with the <rule>-wrapped JSON, no explanation.",
            query
        );

        info!("Generating rule for: {}", query);

        let messages = vec![
            Message {
                role: Role::System,
                content: system_prompt,
            },
            Message {
                role: Role::User,
                content: user_prompt,
            },
        ];

        let response = self
            .provider
            .complete(messages, self.params)
            .await
            .map_err(|source| GenerationError::Backend {
                query: query.to_string(),
                source,
            })?;

        debug!("Backend response: {}", response);

        let candidate = extract_candidate(&response).ok_or_else(|| GenerationError::Parse {
            raw: response.clone(),
        })?;

        let value: serde_json::Value =
            serde_json::from_str(candidate).map_err(|_| GenerationError::Parse {
                raw: response.clone(),
            })?;

        let report = validation::validate_value(&value, catalog);
        for warning in &report.warnings {
            tracing::warn!(path = %warning.path, "{}", warning.message);
        }
        if !report.valid {
            return Err(GenerationError::Schema {
                detail: report.describe_errors(),
                value,
            });
        }

        let rule: Rule = serde_json::from_value(value.clone()).map_err(|e| {
            GenerationError::Schema {
                detail: e.to_string(),
                value,
            }
        })?;

        info!(
            "Generated rule with {} condition(s)",
            rule.conditions.conditions().len()
        );
        Ok(rule)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Backend unreachable or non-200; fatal for the current query.
    #[error("backend unavailable while answering \"{query}\": {source}")]
    Backend {
        query: String,
        #[source]
        source: LlmError,
    },
    /// Response contained no isolable JSON object; raw text retained
    /// for diagnostics.
    #[error("backend response contained no JSON rule")]
    Parse { raw: String },
    /// Parsed JSON does not satisfy the rule invariants.
    #[error("generated rule failed validation: {detail}")]
    Schema {
        detail: String,
        value: serde_json::Value,
    },
}

// ── Candidate extraction ────────────────────────────────────────────
//
// An ordered chain of text transforms, first success wins:
//   1. content between the documented <rule></rule> delimiter pair,
//      falling back to the raw response when absent
//   2. fenced-code-block stripping
//   3. isolation of the brace-delimited JSON object

fn extract_candidate(response: &str) -> Option<&str> {
    let candidate = between_rule_tags(response).unwrap_or(response);
    let candidate = inside_fences(candidate).unwrap_or(candidate);
    brace_span(candidate)
}

fn between_rule_tags(text: &str) -> Option<&str> {
    let start = text.find("<rule>")? + "<rule>".len();
    let end = text[start..].find("</rule>")?;
    Some(text[start..start + end].trim())
}

fn inside_fences(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let start = trimmed.find("```")? + 3;
    // Skip a language identifier on the opening line
    let after_tick = &trimmed[start..];
    let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
    let end = after_tick[content_start..].find("```")?;
    Some(after_tick[content_start..content_start + end].trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Provider returning a canned completion (or failing).
    struct CannedProvider {
        response: Result<String, u16>,
    }

    impl CannedProvider {
        fn ok(text: &str) -> Arc<dyn LlmProvider> {
            Arc::new(Self {
                response: Ok(text.to_string()),
            })
        }

        fn failing(status: u16) -> Arc<dyn LlmProvider> {
            Arc::new(Self {
                response: Err(status),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _params: SamplingParams,
        ) -> Result<String, LlmError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::ApiError {
                    status: *status,
                    body: "backend down".into(),
                }),
            }
        }
    }

    fn generator(provider: Arc<dyn LlmProvider>) -> RuleGenerator {
        RuleGenerator::new(provider, SamplingParams::cold(512))
    }

    const GOOD_RULE: &str = r#"{
        "conditions": { "all": [ { "fact": "amt", "operator": "lessThan", "value": 10 } ] },
        "event": { "type": "transaction-match", "params": { "message": "cheap" } }
    }"#;

    #[test]
    fn template_has_exactly_one_placeholder() {
        assert_eq!(RULE_TEMPLATE.matches(CATALOG_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn extract_from_rule_tags() {
        let input = format!("Here you go:\n<rule>\n{}\n</rule>\nDone.", GOOD_RULE);
        let extracted = extract_candidate(&input).unwrap();
        assert!(extracted.starts_with('{') && extracted.ends_with('}'));
        assert!(extracted.contains("lessThan"));
    }

    #[test]
    fn extract_from_fenced_block() {
        let input = format!("```json\n{}\n```", GOOD_RULE);
        assert!(extract_candidate(&input).is_some());
    }

    #[test]
    fn extract_from_fences_inside_tags() {
        let input = format!("<rule>\n```json\n{}\n```\n</rule>", GOOD_RULE);
        let extracted = extract_candidate(&input).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(extracted).is_ok());
    }

    #[test]
    fn extract_from_raw_response_with_prose() {
        let input = format!("Sure! Here's the rule: {}", GOOD_RULE);
        assert!(extract_candidate(&input).is_some());
    }

    #[test]
    fn extract_without_braces_is_none() {
        assert!(extract_candidate("I cannot answer that.").is_none());
    }

    #[tokio::test]
    async fn generates_valid_rule() {
        let provider = CannedProvider::ok(&format!("<rule>{}</rule>", GOOD_RULE));
        let rule = generator(provider)
            .generate("cheap transactions", &FieldCatalog::transactions())
            .await
            .unwrap();
        assert_eq!(rule.conditions.conditions()[0].fact, "amt");
    }

    #[tokio::test]
    async fn garbage_response_is_parse_error() {
        let provider = CannedProvider::ok("no json here, sorry");
        let err = generator(provider)
            .generate("anything", &FieldCatalog::transactions())
            .await
            .unwrap_err();
        match err {
            GenerationError::Parse { raw } => assert!(raw.contains("no json")),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_shape_is_schema_error() {
        let provider = CannedProvider::ok(r#"{"conditions": {"all": []}, "event": {}}"#);
        let err = generator(provider)
            .generate("anything", &FieldCatalog::transactions())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Schema { .. }));
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let provider = CannedProvider::failing(503);
        let err = generator(provider)
            .generate("big purchases", &FieldCatalog::transactions())
            .await
            .unwrap_err();
        match err {
            GenerationError::Backend { query, .. } => assert_eq!(query, "big purchases"),
            other => panic!("expected Backend, got {:?}", other),
        }
    }
}
