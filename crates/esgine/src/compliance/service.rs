use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{EvaluationResult, Rule};
use super::evaluation::EvaluationError;
use super::ruleset::{RuleSet, RuleSetError};
use crate::config::FrameworkEntry;

/// Lookup seam for framework rule sets (file catalog, in-memory fixtures).
pub trait RuleSetSource: Send + Sync {
    fn fetch(&self, framework: &str) -> Result<Option<Arc<RuleSet>>, RuleSetError>;
    fn frameworks(&self) -> Vec<FrameworkEntry>;
}

/// Single-report evaluation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub report: Value,
    #[serde(
        default,
        deserialize_with = "super::ruleset::deserialize_optional_rules",
        skip_serializing_if = "Option::is_none"
    )]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Many reports checked against one rule set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEvaluationRequest {
    pub reports: Vec<Value>,
    #[serde(
        default,
        deserialize_with = "super::ruleset::deserialize_optional_rules",
        skip_serializing_if = "Option::is_none"
    )]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// Outcome for one report of a batch. Failures never affect sibling reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
    Ok { result: EvaluationResult },
    Error { error: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown framework '{0}'")]
    UnknownFramework(String),
    #[error("request must include inline rules or a framework")]
    MissingRules,
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Service resolving rule sets and running the evaluator.
pub struct ComplianceService<S> {
    source: Arc<S>,
}

impl<S> ComplianceService<S>
where
    S: RuleSetSource + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn frameworks(&self) -> Vec<FrameworkEntry> {
        self.source.frameworks()
    }

    /// Display title for a rule selection, used by exports.
    pub fn title_for(&self, framework: Option<&str>) -> String {
        let Some(framework) = framework else {
            return "Custom rule set".to_string();
        };

        self.frameworks()
            .into_iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(framework.trim()))
            .map(|entry| entry.label)
            .unwrap_or_else(|| framework.to_string())
    }

    /// Inline rules win over a framework reference.
    pub fn resolve_rules(
        &self,
        rules: Option<Vec<Rule>>,
        framework: Option<&str>,
    ) -> Result<Arc<RuleSet>, ServiceError> {
        if let Some(rules) = rules {
            return Ok(Arc::new(RuleSet::new(rules)));
        }

        let framework = framework
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ServiceError::MissingRules)?;

        self.source
            .fetch(framework)?
            .ok_or_else(|| ServiceError::UnknownFramework(framework.to_string()))
    }

    pub fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResult, ServiceError> {
        let EvaluationRequest {
            report,
            rules,
            framework,
        } = request;

        let rule_set = self.resolve_rules(rules, framework.as_deref())?;
        let result = rule_set.evaluate_payload(&report)?;
        Ok(result)
    }

    /// Evaluate each report on the blocking pool, collecting in input order.
    pub async fn evaluate_batch(
        &self,
        request: BatchEvaluationRequest,
    ) -> Result<Vec<BatchItem>, ServiceError> {
        let BatchEvaluationRequest {
            reports,
            rules,
            framework,
        } = request;

        let rule_set = self.resolve_rules(rules, framework.as_deref())?;

        let handles: Vec<_> = reports
            .into_iter()
            .map(|report| {
                let rule_set = Arc::clone(&rule_set);
                tokio::task::spawn_blocking(move || rule_set.evaluate_payload(&report))
            })
            .collect();

        let mut items = Vec::with_capacity(handles.len());
        for handle in handles {
            let item = match handle.await {
                Ok(Ok(result)) => BatchItem::Ok { result },
                Ok(Err(err)) => BatchItem::Error {
                    error: err.to_string(),
                },
                Err(err) => BatchItem::Error {
                    error: format!("evaluation worker failed: {err}"),
                },
            };
            items.push(item);
        }

        Ok(items)
    }
}
