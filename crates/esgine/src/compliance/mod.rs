//! Rule evaluation core for ESG compliance scoring.
//!
//! Reports are classified once into a [`Report`] shape; rules are checked in
//! declaration order and every rule yields exactly one [`RuleResult`]. The
//! service, router, and export layers sit on top of that pure core.

pub mod domain;
pub mod evaluation;
pub mod normalizer;
pub mod report;
pub mod router;
pub mod ruleset;
pub mod service;
pub mod source;

#[cfg(test)]
mod tests;

pub use domain::{EvaluationResult, MatchKind, Rule, RuleResult, RuleTarget};
pub use evaluation::{
    compliance_score, evaluate, evaluate_payload, EvaluationError, MalformedRule, ScoreBand,
};
pub use normalizer::Report;
pub use report::{ComplianceSummaryView, ExportError, ExportFormat, RuleBreakdownRow};
pub use router::compliance_router;
pub use ruleset::{RuleSet, RuleSetError};
pub use service::{
    BatchEvaluationRequest, BatchItem, ComplianceService, EvaluationRequest, RuleSetSource,
    ServiceError,
};
pub use source::{read_report, ReportMedia, ReportSourceError};
