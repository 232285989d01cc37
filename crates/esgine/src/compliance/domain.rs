use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::evaluation::ScoreBand;

/// Selects how a rule's key is matched against structured reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Exact, case-insensitive match against key names.
    Field,
    /// Key match, or substring presence inside any stringified value.
    Keyword,
}

impl MatchKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Keyword => "keyword",
        }
    }
}

/// The string a rule looks for, tagged with its match discipline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleTarget {
    pub kind: MatchKind,
    pub key: String,
}

impl RuleTarget {
    pub fn field(key: impl Into<String>) -> Self {
        Self {
            kind: MatchKind::Field,
            key: key.into(),
        }
    }

    pub fn keyword(key: impl Into<String>) -> Self {
        Self {
            kind: MatchKind::Keyword,
            key: key.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.key.trim().is_empty()
    }
}

/// One declarative compliance requirement.
///
/// Rule documents spell the target as either `field:` or `keyword:`; the
/// spelling decides the [`MatchKind`]. A rule declaring neither, or one whose
/// entry could not be read at all (`defect`), is kept and reported as
/// malformed at evaluation time. An empty key is a declared target that never
/// matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleDocument", into = "RuleDocument")]
pub struct Rule {
    pub id: Option<String>,
    pub target: Option<RuleTarget>,
    pub must_exist: bool,
    pub must_contain: Vec<String>,
    pub description: Option<String>,
    pub defect: Option<String>,
}

impl Rule {
    /// Field rule requiring the key to be present.
    pub fn field(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::required(id.into(), RuleTarget::field(key))
    }

    /// Keyword rule requiring the term to be present.
    pub fn keyword(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::required(id.into(), RuleTarget::keyword(key))
    }

    fn required(id: String, target: RuleTarget) -> Self {
        Self {
            id: Some(id),
            target: Some(target),
            must_exist: true,
            must_contain: Vec::new(),
            description: None,
            defect: None,
        }
    }

    /// Placeholder for a rule-document entry that failed to parse. The id and
    /// description are salvaged from the raw entry when they are readable.
    pub fn invalid(entry: &Value, reason: impl Into<String>) -> Self {
        let text = |key: &str| entry.get(key).and_then(scalar_text);

        Self {
            id: text("id").or_else(|| text("rule_id")),
            target: None,
            must_exist: false,
            must_contain: Vec::new(),
            description: text("description"),
            defect: Some(reason.into()),
        }
    }

    /// Flip the rule so that it is satisfied by the target's absence.
    pub fn absent(mut self) -> Self {
        self.must_exist = false;
        self
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.must_contain = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declared id, or the 1-based positional id `rule-<n>` when none was given.
    pub fn resolved_id(&self, position: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("rule-{}", position + 1),
        }
    }

    pub fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }

        match (&self.defect, &self.target) {
            (Some(_), _) => "Rule definition could not be read".to_string(),
            (None, Some(target)) => {
                format!("Check for {} '{}'", target.kind.label(), target.key)
            }
            (None, None) => "Rule declares no field or keyword".to_string(),
        }
    }
}

/// Wire shape of a rule inside YAML/JSON rule documents.
///
/// Scalars are read leniently: numeric or boolean ids and keys are
/// stringified, a null `must_exist` means `false`, and a single
/// `must_contain` string is a one-term list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuleDocument {
    #[serde(
        default,
        alias = "rule_id",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    field: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    must_exist: bool,
    #[serde(
        default,
        deserialize_with = "lenient_terms",
        skip_serializing_if = "Option::is_none"
    )]
    must_contain: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    description: Option<String>,
}

impl From<RuleDocument> for Rule {
    fn from(document: RuleDocument) -> Self {
        // A non-blank spelling wins; a declared but blank key stays a target.
        let target = match (document.field, document.keyword) {
            (Some(field), Some(keyword))
                if field.trim().is_empty() && !keyword.trim().is_empty() =>
            {
                Some(RuleTarget::keyword(keyword))
            }
            (Some(field), _) => Some(RuleTarget::field(field)),
            (None, Some(keyword)) => Some(RuleTarget::keyword(keyword)),
            (None, None) => None,
        };

        Self {
            id: document.id,
            target,
            must_exist: document.must_exist,
            must_contain: document.must_contain.unwrap_or_default(),
            description: document.description,
            defect: None,
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => scalar_text(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a scalar, found {value}"))),
    }
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" | "" => Ok(false),
            _ => Err(D::Error::custom(format!("expected a boolean, found '{text}'"))),
        },
        other => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
    }
}

fn lenient_terms<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                scalar_text(item).ok_or_else(|| {
                    D::Error::custom(format!("must_contain terms must be scalars, found {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        value => scalar_text(&value)
            .map(|term| Some(vec![term]))
            .ok_or_else(|| D::Error::custom(format!("expected a list of terms, found {value}"))),
    }
}

impl From<Rule> for RuleDocument {
    fn from(rule: Rule) -> Self {
        let (field, keyword) = match rule.target {
            Some(RuleTarget {
                kind: MatchKind::Field,
                key,
            }) => (Some(key), None),
            Some(RuleTarget {
                kind: MatchKind::Keyword,
                key,
            }) => (None, Some(key)),
            None => (None, None),
        };

        Self {
            id: rule.id,
            field,
            keyword,
            must_exist: rule.must_exist,
            must_contain: (!rule.must_contain.is_empty()).then_some(rule.must_contain),
            description: rule.description,
        }
    }
}

/// Per-rule verdict, one for every input rule and in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    pub description: String,
    pub must_exist: bool,
    pub found: bool,
    pub content_compliant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_term: Option<String>,
    pub compliant: bool,
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RuleResult {
    pub const fn status_label(&self) -> &'static str {
        if self.status {
            "PASSED"
        } else {
            "FAILED"
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.match_kind.is_none()
    }
}

/// Aggregate output of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub passed: usize,
    pub failed: usize,
    pub rule_results: Vec<RuleResult>,
}

impl EvaluationResult {
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            passed: 0,
            failed: 0,
            rule_results: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }

    pub fn malformed(&self) -> impl Iterator<Item = &RuleResult> {
        self.rule_results.iter().filter(|result| result.is_malformed())
    }
}
