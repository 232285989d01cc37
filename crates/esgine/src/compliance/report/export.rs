use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::EvaluationResult;
use super::views::{breakdown, ComplianceSummaryView};

const LINES_PER_PAGE: usize = 40;
const PAGE_BREAK: char = '\u{c}';

/// Downloadable artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "text" | "txt" => Ok(Self::Text),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown export format '{0}' (expected json, csv, or text)")]
    UnknownFormat(String),
    #[error("failed to encode JSON export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to encode CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub fn render(
    format: ExportFormat,
    result: &EvaluationResult,
    title: &str,
    generated_on: NaiveDate,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json(result),
        ExportFormat::Csv => to_csv(result),
        ExportFormat::Text => Ok(to_text(result, title, generated_on)),
    }
}

/// Machine-readable dump of the full result.
pub fn to_json(result: &EvaluationResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Tabular rule breakdown, one row per rule.
pub fn to_csv(result: &EvaluationResult) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in breakdown(result) {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Human-readable summary paginated into fixed-height pages, each closed by a
/// `Page N` footer and separated by form feeds.
pub fn to_text(result: &EvaluationResult, title: &str, generated_on: NaiveDate) -> String {
    let summary = ComplianceSummaryView::from_result(result, title, generated_on);

    let mut lines = vec![
        "ESGine Compliance Report".to_string(),
        "========================".to_string(),
        format!("Rule set: {}", summary.title),
        format!("Generated: {}", summary.generated_on),
        format!("Score: {:.2}%", summary.score),
        format!("Passed: {} | Failed: {}", summary.passed, summary.failed),
        summary.band_message.to_string(),
    ];
    if summary.malformed > 0 {
        lines.push(format!(
            "{} rule(s) could not be evaluated and were marked non-compliant.",
            summary.malformed
        ));
    }
    lines.push(String::new());
    lines.push("Rule breakdown:".to_string());

    for rule in &result.rule_results {
        let mut line = format!("- {} -> {}", rule.description, rule.status_label());
        if let Some(note) = &rule.note {
            let _ = write!(line, " ({note})");
        } else if let Some(term) = &rule.missing_term {
            let _ = write!(line, " (missing '{term}')");
        }
        lines.push(line);
    }

    let pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
    let mut document = String::new();
    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            document.push(PAGE_BREAK);
        }
        for line in page.iter() {
            document.push_str(line);
            document.push('\n');
        }
        let _ = writeln!(document, "\nPage {}", index + 1);
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::domain::Rule;
    use crate::compliance::evaluation::evaluate;
    use crate::compliance::normalizer::Report;
    use serde_json::json;

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date")
    }

    fn sample_result() -> EvaluationResult {
        let report = json!({
            "board_oversight": "Board reviews climate risk quarterly",
            "emissions": "Scope 1: 10t",
        });
        let rules = vec![
            Rule::field("r1", "board_oversight").with_description("Board oversight disclosed"),
            Rule::field("r2", "emissions")
                .with_terms(["scope 1", "scope 2"])
                .with_description("Scope 1 and 2 emissions"),
            Rule {
                id: Some("r3".to_string()),
                target: None,
                must_exist: true,
                must_contain: Vec::new(),
                description: None,
                defect: None,
            },
        ];
        let report = Report::from_payload(&report).expect("structured report");
        evaluate(&report, &rules)
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().expect("csv"), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().expect("txt"), ExportFormat::Text);
        match "pdf".parse::<ExportFormat>() {
            Err(ExportError::UnknownFormat(format)) => assert_eq!(format, "pdf"),
            other => panic!("expected unknown format, got {other:?}"),
        }
    }

    #[test]
    fn json_export_keeps_contract_field_names() {
        let json = to_json(&sample_result()).expect("json renders");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 2);
        assert_eq!(value["rule_results"][0]["field"], "board_oversight");
        assert_eq!(value["rule_results"][0]["status"], true);
        assert_eq!(value["rule_results"][1]["description"], "Scope 1 and 2 emissions");
    }

    #[test]
    fn csv_export_has_header_and_one_row_per_rule() {
        let csv = to_csv(&sample_result()).expect("csv renders");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "rule_id,field,match_kind,must_exist,found,compliant,description,note"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("r2,emissions,field,true,true,false,"));
        assert!(lines[2].contains("missing term 'scope 2'"));
        assert!(lines[3].starts_with("r3,,,true,false,false,"));
    }

    #[test]
    fn text_export_lists_each_rule_with_status() {
        let text = to_text(&sample_result(), "Global - ISSB", generated_on());

        assert!(text.starts_with("ESGine Compliance Report\n"));
        assert!(text.contains("Rule set: Global - ISSB"));
        assert!(text.contains("Generated: 2025-03-31"));
        assert!(text.contains("Score: 33.33%"));
        assert!(text.contains("Passed: 1 | Failed: 2"));
        assert!(text.contains("- Board oversight disclosed -> PASSED"));
        assert!(text.contains("- Scope 1 and 2 emissions -> FAILED (missing 'scope 2')"));
        assert!(text.contains("1 rule(s) could not be evaluated"));
        assert!(text.trim_end().ends_with("Page 1"));
    }

    #[test]
    fn long_breakdowns_span_multiple_pages() {
        let rules: Vec<Rule> = (0..60)
            .map(|index| Rule::keyword(format!("r{index}"), format!("term-{index}")))
            .collect();
        let result = evaluate(&Report::text("term-1 appears here"), &rules);

        let text = to_text(&result, "Custom rule set", generated_on());

        assert_eq!(text.matches(PAGE_BREAK).count(), 1);
        assert!(text.contains("Page 2"));
    }
}
