use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{EvaluationResult, Rule};
use super::evaluation::{self, EvaluationError};
use super::normalizer::Report;

/// Ordered, immutable collection of rules parsed from a rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "compliance_check",
        alias = "rules",
        default,
        deserialize_with = "deserialize_rules"
    )]
    rules: Vec<Rule>,
}

/// Errors raised while reading rule documents.
#[derive(Debug, thiserror::Error)]
pub enum RuleSetError {
    #[error("rule file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read rule file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse YAML rule document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid rule document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule document must be a list of rules or a mapping with `compliance_check`")]
    UnexpectedShape,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            framework: None,
            version: None,
            rules,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, report: &Report) -> EvaluationResult {
        evaluation::evaluate(report, &self.rules)
    }

    pub fn evaluate_payload(&self, payload: &Value) -> Result<EvaluationResult, EvaluationError> {
        evaluation::evaluate_payload(payload, &self.rules)
    }

    /// Parse a rule document given as YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self, RuleSetError> {
        let document: Value = serde_yaml::from_str(source)?;
        Self::from_document(document)
    }

    /// Parse a rule document given as JSON.
    pub fn from_json_str(source: &str) -> Result<Self, RuleSetError> {
        let document: Value = serde_json::from_str(source)?;
        Self::from_document(document)
    }

    /// Accepts either a bare list of rules or a mapping carrying
    /// `compliance_check` (or `rules`) plus optional metadata.
    pub fn from_document(document: Value) -> Result<Self, RuleSetError> {
        match document {
            Value::Array(entries) => Ok(Self::new(rules_from_entries(entries))),
            Value::Object(_) => Ok(serde_json::from_value(document)?),
            Value::Null => Ok(Self::default()),
            _ => Err(RuleSetError::UnexpectedShape),
        }
    }

    /// Load a rule file; `.yaml`/`.yml` files parse as YAML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RuleSetError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RuleSetError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let rule_set = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        debug!(path = %path.display(), rules = rule_set.len(), "loaded rule set");
        Ok(rule_set)
    }
}

/// Parse rule entries one at a time. An entry that cannot be read becomes an
/// invalid rule carrying the parse error instead of failing its siblings.
pub fn rules_from_entries(entries: Vec<Value>) -> Vec<Rule> {
    entries
        .into_iter()
        .map(|entry| {
            Rule::deserialize(&entry).unwrap_or_else(|err| {
                warn!(error = %err, "unreadable rule entry kept as malformed");
                Rule::invalid(&entry, err.to_string())
            })
        })
        .collect()
}

pub(crate) fn deserialize_rules<'de, D>(deserializer: D) -> Result<Vec<Rule>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(rules_from_entries(entries.unwrap_or_default()))
}

pub(crate) fn deserialize_optional_rules<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<Rule>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(entries.map(rules_from_entries))
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
