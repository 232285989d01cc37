use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};

use crate::compliance::domain::Rule;
use crate::compliance::ruleset::{RuleSet, RuleSetError};
use crate::compliance::service::{ComplianceService, RuleSetSource};
use crate::compliance::compliance_router;
use crate::config::FrameworkEntry;

/// Rule sets held in memory, keyed by lower-cased framework slug.
#[derive(Default)]
pub(super) struct MemoryRuleSets {
    entries: Vec<FrameworkEntry>,
    rule_sets: HashMap<String, Arc<RuleSet>>,
    fetches: Mutex<Vec<String>>,
}

impl MemoryRuleSets {
    pub(super) fn with(mut self, key: &str, label: &str, rules: Vec<Rule>) -> Self {
        self.entries.push(FrameworkEntry {
            key: key.to_string(),
            label: label.to_string(),
            path: PathBuf::from(format!("{key}.yaml")),
        });
        self.rule_sets.insert(
            key.to_ascii_lowercase(),
            Arc::new(RuleSet::new(rules).with_framework(label)),
        );
        self
    }

    pub(super) fn fetched(&self) -> Vec<String> {
        self.fetches.lock().expect("fetch log mutex poisoned").clone()
    }
}

impl RuleSetSource for MemoryRuleSets {
    fn fetch(&self, framework: &str) -> Result<Option<Arc<RuleSet>>, RuleSetError> {
        self.fetches
            .lock()
            .expect("fetch log mutex poisoned")
            .push(framework.to_string());
        Ok(self.rule_sets.get(&framework.to_ascii_lowercase()).cloned())
    }

    fn frameworks(&self) -> Vec<FrameworkEntry> {
        self.entries.clone()
    }
}

/// Source whose backing store is unreadable.
pub(super) struct BrokenRuleSets;

impl RuleSetSource for BrokenRuleSets {
    fn fetch(&self, _framework: &str) -> Result<Option<Arc<RuleSet>>, RuleSetError> {
        Err(RuleSetError::UnexpectedShape)
    }

    fn frameworks(&self) -> Vec<FrameworkEntry> {
        Vec::new()
    }
}

pub(super) fn issb_rules() -> Vec<Rule> {
    vec![
        Rule::field("s1-governance", "governance").with_description("Governance disclosures"),
        Rule::field("s2-emissions", "emissions")
            .with_terms(["scope 1", "scope 2"])
            .with_description("Scope 1 and 2 emissions"),
        Rule::keyword("no-greenwashing", "greenwashing").absent(),
    ]
}

pub(super) fn memory_source() -> MemoryRuleSets {
    MemoryRuleSets::default().with("issb", "Global - ISSB (IFRS S1 & S2)", issb_rules())
}

pub(super) fn service() -> Arc<ComplianceService<MemoryRuleSets>> {
    Arc::new(ComplianceService::new(Arc::new(memory_source())))
}

pub(super) fn router() -> Router {
    compliance_router(service())
}

pub(super) fn compliant_report() -> Value {
    json!({
        "governance": "Board sustainability committee meets quarterly",
        "emissions": "Scope 1: 1,200 tCO2e; Scope 2: 800 tCO2e",
        "targets": "Net zero by 2040",
    })
}

pub(super) fn partial_report() -> Value {
    json!({
        "governance": "Board oversight",
        "emissions": "Scope 1 only",
        "marketing": "Accusations of greenwashing were dismissed",
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
