pub mod export;
pub mod views;

pub use export::{render, ExportError, ExportFormat};
pub use views::{ComplianceSummaryView, RuleBreakdownRow};
