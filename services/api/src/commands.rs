use crate::infra::{load_report, FileRuleSetSource};
use chrono::Local;
use clap::{ArgGroup, Args};
use esgine::compliance::report;
use esgine::compliance::{
    BatchEvaluationRequest, BatchItem, ComplianceService, ExportFormat, RuleSet,
};
use esgine::config::AppConfig;
use esgine::error::AppError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("rule_source")
        .required(true)
        .args(["rules", "framework"])
))]
pub(crate) struct EvaluateArgs {
    /// Rule document (YAML or JSON) to evaluate against
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Framework slug from the configured catalog (see `frameworks`)
    #[arg(long)]
    pub(crate) framework: Option<String>,
    /// Report file to evaluate (.json or extracted .txt); repeat for a batch
    #[arg(long = "report", required = true)]
    pub(crate) reports: Vec<PathBuf>,
    /// Output format: text, json, or csv
    #[arg(long, default_value = "text", value_parser = parse_format)]
    pub(crate) format: ExportFormat,
    /// Write one file per report into this directory instead of stdout
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        rules,
        framework,
        reports,
        format,
        output_dir,
    } = args;

    let config = AppConfig::load()?;
    let service = ComplianceService::new(Arc::new(FileRuleSetSource::new(config.rules)));

    let (inline_rules, title) = match rules {
        Some(path) => {
            let rule_set = RuleSet::load(&path)?;
            let title = rule_set
                .framework
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            (Some(rule_set.rules().to_vec()), title)
        }
        None => (None, service.title_for(framework.as_deref())),
    };

    let mut loaded = Vec::with_capacity(reports.len());
    let mut payloads = Vec::with_capacity(reports.len());
    for path in reports {
        match load_report(&path) {
            Ok(payload) => {
                payloads.push(payload);
                loaded.push(path);
            }
            Err(err) => println!("- {}: skipped ({})", path.display(), err),
        }
    }

    let items = service
        .evaluate_batch(BatchEvaluationRequest {
            reports: payloads,
            rules: inline_rules,
            framework,
        })
        .await?;

    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let generated_on = Local::now().date_naive();
    let mut written = HashSet::new();
    for (path, item) in loaded.iter().zip(items) {
        let result = match item {
            BatchItem::Ok { result } => result,
            BatchItem::Error { error } => {
                println!("- {}: evaluation failed ({})", path.display(), error);
                continue;
            }
        };

        let rendered = report::render(format, &result, &title, generated_on)?;
        match &output_dir {
            Some(dir) => {
                let target = output_path(dir, path, format, &mut written);
                std::fs::write(&target, rendered)?;
                println!(
                    "- {} -> {} (score {:.2}%, {})",
                    path.display(),
                    target.display(),
                    result.score,
                    result.band().label()
                );
            }
            None => {
                println!("== {} ==", path.display());
                println!("{}", rendered);
            }
        }
    }

    Ok(())
}

pub(crate) fn run_frameworks() -> Result<(), AppError> {
    let config = AppConfig::load()?;

    println!(
        "Configured frameworks (rules directory {})",
        config.rules.rules_dir.display()
    );
    for entry in config.rules.catalog.entries() {
        let path = config.rules.path_for(entry);
        match RuleSet::load(&path) {
            Ok(rule_set) => println!(
                "- {} [{}] -> {} ({} rules)",
                entry.label,
                entry.key,
                path.display(),
                rule_set.len()
            ),
            Err(err) => println!(
                "- {} [{}] -> {} (unavailable: {})",
                entry.label,
                entry.key,
                path.display(),
                err
            ),
        }
    }

    Ok(())
}

pub(crate) fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse::<ExportFormat>().map_err(|err| err.to_string())
}

/// Output file for a report, named after its stem. Stems already claimed in
/// this run get a `-2`, `-3`, ... suffix.
pub(crate) fn output_path(
    dir: &Path,
    report: &Path,
    format: ExportFormat,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let stem = report
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("report");

    let mut target = dir.join(format!("{}.{}", stem, format.extension()));
    let mut copy = 2;
    while taken.contains(&target) {
        target = dir.join(format!("{}-{}.{}", stem, copy, format.extension()));
        copy += 1;
    }

    taken.insert(target.clone());
    target
}
