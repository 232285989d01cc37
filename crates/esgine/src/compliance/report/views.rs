use chrono::NaiveDate;
use serde::Serialize;

use super::super::domain::{EvaluationResult, RuleResult};
use super::super::evaluation::ScoreBand;

/// Headline figures for a score metric or summary page.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceSummaryView {
    pub title: String,
    pub score: f64,
    pub band: ScoreBand,
    pub band_label: &'static str,
    pub band_message: &'static str,
    pub passed: usize,
    pub failed: usize,
    pub malformed: usize,
    pub generated_on: NaiveDate,
}

impl ComplianceSummaryView {
    pub fn from_result(result: &EvaluationResult, title: &str, generated_on: NaiveDate) -> Self {
        let band = result.band();
        Self {
            title: title.to_string(),
            score: result.score,
            band,
            band_label: band.label(),
            band_message: band.message(),
            passed: result.passed,
            failed: result.failed,
            malformed: result.malformed().count(),
            generated_on,
        }
    }
}

/// One row of the tabular rule breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RuleBreakdownRow {
    pub rule_id: String,
    pub field: String,
    pub match_kind: &'static str,
    pub must_exist: bool,
    pub found: bool,
    pub compliant: bool,
    pub description: String,
    pub note: Option<String>,
}

impl From<&RuleResult> for RuleBreakdownRow {
    fn from(result: &RuleResult) -> Self {
        let note = match (&result.note, &result.missing_term) {
            (Some(note), _) => Some(note.clone()),
            (None, Some(term)) => Some(format!("missing term '{term}'")),
            (None, None) => None,
        };

        Self {
            rule_id: result.rule_id.clone(),
            field: result.field.clone(),
            match_kind: result.match_kind.map(|kind| kind.label()).unwrap_or(""),
            must_exist: result.must_exist,
            found: result.found,
            compliant: result.compliant,
            description: result.description.clone(),
            note,
        }
    }
}

pub fn breakdown(result: &EvaluationResult) -> Vec<RuleBreakdownRow> {
    result.rule_results.iter().map(RuleBreakdownRow::from).collect()
}
