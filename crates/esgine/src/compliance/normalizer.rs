use serde_json::{Map, Value};

use super::domain::{MatchKind, RuleTarget};
use super::evaluation::EvaluationError;

/// Report payload resolved once into one of the two canonical shapes.
///
/// Keys, values and text are lower-cased at construction so every lookup
/// during evaluation is a plain comparison or substring scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Structured(StructuredReport),
    Unstructured(UnstructuredReport),
}

/// Key-value report content (e.g. a parsed JSON document).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredReport {
    entries: Vec<NormalizedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedEntry {
    key: String,
    value: String,
}

/// Plain text extracted upstream from PDF/DOCX/TXT sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnstructuredReport {
    text: String,
}

impl Report {
    /// Classify a JSON payload. `null` is treated as empty text.
    pub fn from_payload(payload: &Value) -> Result<Self, EvaluationError> {
        match payload {
            Value::Object(map) => Ok(Self::structured(map)),
            Value::String(text) => Ok(Self::text(text)),
            Value::Null => Ok(Self::text("")),
            Value::Array(_) => Err(EvaluationError::UnsupportedReportType { kind: "array" }),
            Value::Number(_) => Err(EvaluationError::UnsupportedReportType { kind: "number" }),
            Value::Bool(_) => Err(EvaluationError::UnsupportedReportType { kind: "boolean" }),
        }
    }

    pub fn structured(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .map(|(key, value)| NormalizedEntry {
                key: key.to_lowercase(),
                value: stringify(value).to_lowercase(),
            })
            .collect();

        Self::Structured(StructuredReport { entries })
    }

    pub fn text(text: &str) -> Self {
        Self::Unstructured(UnstructuredReport {
            text: text.to_lowercase(),
        })
    }

    pub const fn shape_label(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Unstructured(_) => "unstructured",
        }
    }

    /// Whether the rule target appears in the report.
    ///
    /// Text reports use substring presence for both rule kinds. Structured
    /// reports use exact key match for field rules, and key match or
    /// value substring for keyword rules.
    pub fn exists(&self, target: &RuleTarget) -> bool {
        if target.is_blank() {
            return false;
        }

        let needle = target.key.to_lowercase();
        match self {
            Self::Unstructured(report) => report.text.contains(&needle),
            Self::Structured(report) => match target.kind {
                MatchKind::Field => report.entry(&needle).is_some(),
                MatchKind::Keyword => {
                    report.entry(&needle).is_some() || report.mentioning(&needle).is_some()
                }
            },
        }
    }

    /// Whether every term appears inside the content scoped by the target.
    pub fn contains(&self, target: &RuleTarget, terms: &[String]) -> bool {
        self.first_missing(target, terms).is_none()
    }

    /// First term absent from the target's content scope, stopping at the
    /// first miss.
    pub fn first_missing<'t>(&self, target: &RuleTarget, terms: &'t [String]) -> Option<&'t str> {
        let scope = self.scope(target);
        terms
            .iter()
            .find(|term| !scope.contains(&term.to_lowercase()))
            .map(String::as_str)
    }

    fn scope(&self, target: &RuleTarget) -> &str {
        let needle = target.key.to_lowercase();
        match self {
            Self::Unstructured(report) => &report.text,
            Self::Structured(report) => {
                let entry = match target.kind {
                    MatchKind::Field => report.entry(&needle),
                    MatchKind::Keyword => report
                        .entry(&needle)
                        .or_else(|| report.mentioning(&needle)),
                };
                entry.map(|entry| entry.value.as_str()).unwrap_or("")
            }
        }
    }
}

impl StructuredReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, needle: &str) -> Option<&NormalizedEntry> {
        if needle.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| entry.key == needle)
    }

    fn mentioning(&self, needle: &str) -> Option<&NormalizedEntry> {
        if needle.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| entry.value.contains(needle))
    }
}

impl UnstructuredReport {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
