use esgine::compliance::{
    read_report, ReportMedia, ReportSourceError, RuleSet, RuleSetError, RuleSetSource,
};
use esgine::config::{FrameworkEntry, RulesConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Framework rule sets read from the rules directory, parsed once per slug.
pub(crate) struct FileRuleSetSource {
    config: RulesConfig,
    cache: Mutex<HashMap<String, Arc<RuleSet>>>,
}

impl FileRuleSetSource {
    pub(crate) fn new(config: RulesConfig) -> Self {
        Self {
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl RuleSetSource for FileRuleSetSource {
    fn fetch(&self, framework: &str) -> Result<Option<Arc<RuleSet>>, RuleSetError> {
        let Some(entry) = self.config.catalog.find(framework) else {
            return Ok(None);
        };

        let key = entry.key.to_ascii_lowercase();
        if let Some(cached) = self
            .cache
            .lock()
            .expect("rule set cache mutex poisoned")
            .get(&key)
        {
            return Ok(Some(Arc::clone(cached)));
        }

        let path = self.config.path_for(entry);
        let rule_set = RuleSet::load(&path)?;
        let rule_set = Arc::new(if rule_set.framework.is_some() {
            rule_set
        } else {
            rule_set.with_framework(entry.label.clone())
        });
        debug!(framework = %entry.key, path = %path.display(), "cached framework rule set");

        self.cache
            .lock()
            .expect("rule set cache mutex poisoned")
            .insert(key, Arc::clone(&rule_set));
        Ok(Some(rule_set))
    }

    fn frameworks(&self) -> Vec<FrameworkEntry> {
        self.config.catalog.entries().to_vec()
    }
}

/// Classify a report file by its guessed MIME type.
pub(crate) fn report_media_for(path: &Path) -> Result<ReportMedia, ReportSourceError> {
    let guess = mime_guess::from_path(path).first();

    match guess {
        Some(mime) if mime.essence_str() == "application/json" => Ok(ReportMedia::Json),
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => Ok(ReportMedia::Text),
        other => Err(ReportSourceError::UnsupportedMedia {
            path: path.to_path_buf(),
            media: other
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }),
    }
}

pub(crate) fn load_report(path: &Path) -> Result<Value, ReportSourceError> {
    let media = report_media_for(path)?;
    read_report(path, media)
}
