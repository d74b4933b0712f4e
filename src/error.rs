use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the ingestion/transform pipeline. Any of these aborts the
/// run before the output artifact is touched.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("{}:{line}: cannot parse {field} '{value}': {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{}:{line}: invalid row: {message}", .path.display())]
    Validation {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no source extracts given")]
    NoSources,
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the region query engine. Recoverable: the caller can retry
/// with a valid selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid region selector '{0}' (expected one of: all, north, south, east, west)")]
    InvalidSelector(String),
}
