mod rules;
mod scoring;

pub use scoring::{compliance_score, ScoreBand};

use serde_json::Value;
use tracing::debug;

use super::domain::{EvaluationResult, Rule};
use super::normalizer::Report;
use scoring::ScoreTally;

/// Fatal errors: no rule can be evaluated against the supplied payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("unsupported report type: expected a JSON object or text, found {kind}")]
    UnsupportedReportType { kind: &'static str },
}

/// Per-rule defects. These are recorded on the rule's result, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedRule {
    #[error("rule {rule_id} declares neither a field nor a keyword")]
    MissingTarget { rule_id: String },
    #[error("rule {rule_id} could not be read: {reason}")]
    Unreadable { rule_id: String, reason: String },
}

/// Evaluate every rule, in declaration order, against a normalized report.
pub fn evaluate(report: &Report, rules: &[Rule]) -> EvaluationResult {
    let mut tally = ScoreTally::default();
    let mut rule_results = Vec::with_capacity(rules.len());

    for (position, rule) in rules.iter().enumerate() {
        let result = rules::check_rule(position, rule, report);
        tally.record(result.compliant);
        rule_results.push(result);
    }

    let score = tally.score();
    debug!(
        shape = report.shape_label(),
        passed = tally.passed,
        failed = tally.failed,
        score,
        "compliance evaluation finished"
    );

    EvaluationResult {
        score,
        passed: tally.passed,
        failed: tally.failed,
        rule_results,
    }
}

/// Classify a raw payload and evaluate it.
pub fn evaluate_payload(payload: &Value, rules: &[Rule]) -> Result<EvaluationResult, EvaluationError> {
    let report = Report::from_payload(payload)?;
    Ok(evaluate(&report, rules))
}
