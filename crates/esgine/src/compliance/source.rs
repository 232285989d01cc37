use std::path::{Path, PathBuf};

use serde_json::Value;

/// Media the engine can consume once text extraction has happened upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMedia {
    Json,
    Text,
}

/// Failure to turn a report file into an evaluation payload.
#[derive(Debug, thiserror::Error)]
pub enum ReportSourceError {
    #[error("failed to read report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("report {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("report {} has unsupported media type {media}; extract its text first", path.display())]
    UnsupportedMedia { path: PathBuf, media: String },
}

/// Read a report file into the payload shape the evaluator classifies.
pub fn read_report(path: &Path, media: ReportMedia) -> Result<Value, ReportSourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match media {
        ReportMedia::Json => {
            serde_json::from_str(&content).map_err(|source| ReportSourceError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        ReportMedia::Text => Ok(Value::String(content)),
    }
}
