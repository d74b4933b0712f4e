// ⚙️ Configuration - defaults and source discovery

use crate::error::PipelineError;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_TARGET_PRODUCT: &str = "pink morsel";
pub const DEFAULT_OUTPUT: &str = "pink_morsel_data.csv";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8050";

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub sources: Vec<PathBuf>,
    pub target_product: String,
    pub output: PathBuf,
}

impl PipelineConfig {
    /// Explicit sources win; otherwise every `*.csv` in `data_dir`, by name
    pub fn resolve(
        data_dir: &Path,
        explicit_sources: Vec<PathBuf>,
        target_product: &str,
        output: &Path,
    ) -> Result<Self, PipelineError> {
        let sources = if explicit_sources.is_empty() {
            discover_sources(data_dir, output)?
        } else {
            explicit_sources
        };

        if sources.is_empty() {
            return Err(PipelineError::NoSources);
        }

        Ok(PipelineConfig {
            sources,
            target_product: target_product.to_string(),
            output: output.to_path_buf(),
        })
    }
}

/// Settings for one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub dataset: PathBuf,
    pub region: String,
    pub json: bool,
}

/// CSV extracts in `dir`, sorted by file name. `output` is skipped when it
/// lives in the same directory, so a rerun never reads its own artifact.
pub fn discover_sources(dir: &Path, output: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let output = normalize(output);
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        let is_output = normalize(&path) == output;

        if path.is_file() && is_csv && !is_output {
            sources.push(path);
        }
    }

    sources.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(sources)
}

/// Absolute form of `path`; works for an output that does not exist yet
fn normalize(path: &Path) -> PathBuf {
    if let Ok(absolute) = path.canonicalize() {
        return absolute;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
