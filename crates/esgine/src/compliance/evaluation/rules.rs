use tracing::warn;

use super::super::domain::{Rule, RuleResult};
use super::super::normalizer::Report;
use super::MalformedRule;

pub(crate) fn check_rule(position: usize, rule: &Rule, report: &Report) -> RuleResult {
    let rule_id = rule.resolved_id(position);
    let description = rule.description();

    let target = match (&rule.defect, &rule.target) {
        (None, Some(target)) => target,
        (Some(reason), _) => {
            let defect = MalformedRule::Unreadable {
                rule_id: rule_id.clone(),
                reason: reason.clone(),
            };
            return malformed(rule_id, description, rule, defect);
        }
        (None, None) => {
            let defect = MalformedRule::MissingTarget {
                rule_id: rule_id.clone(),
            };
            return malformed(rule_id, description, rule, defect);
        }
    };

    // Blank keys never match, so they only satisfy absence rules.
    let found = report.exists(target);

    // Content terms only apply once the target was located.
    let missing_term = if found && !rule.must_contain.is_empty() {
        Some(report.first_missing(target, &rule.must_contain))
    } else {
        None
    };
    let content_compliant = missing_term.map(|missing| missing.is_none());
    let compliant = found == rule.must_exist && content_compliant.unwrap_or(true);

    RuleResult {
        rule_id,
        field: target.key.clone(),
        match_kind: Some(target.kind),
        description,
        must_exist: rule.must_exist,
        found,
        content_compliant,
        missing_term: missing_term.flatten().map(str::to_string),
        compliant,
        status: compliant,
        note: None,
    }
}

fn malformed(rule_id: String, description: String, rule: &Rule, defect: MalformedRule) -> RuleResult {
    warn!(%rule_id, "{defect}; recording as non-compliant");

    RuleResult {
        rule_id,
        field: String::new(),
        match_kind: None,
        description,
        must_exist: rule.must_exist,
        found: false,
        content_compliant: None,
        missing_term: None,
        compliant: false,
        status: false,
        note: Some(defect.to_string()),
    }
}
