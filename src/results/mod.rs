//! Results store - write/read contract for finished analyses
//!
//! An analysis is stored whole, as one immutable JSON document per analysis
//! id. The store trait keeps the backend swappable; the file-backed
//! implementation below is the default.

use crate::analyzer::CohesionResult;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from storing or loading analysis results
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("invalid analysis id '{0}': only letters, digits, '-' and '_' are allowed")]
    InvalidId(String),

    #[error("analysis '{0}' not found")]
    NotFound(String),

    #[error("failed to access results store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode result document: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Capability for persisting and retrieving complete analyses
pub trait ResultsStore: Send + Sync {
    /// Stores a complete analysis under the given id, replacing any previous
    /// document with the same id
    fn store(&self, analysis_id: &str, result: &CohesionResult) -> Result<(), ResultsError>;

    /// Loads a previously stored analysis
    fn load(&self, analysis_id: &str) -> Result<CohesionResult, ResultsError>;
}

/// File-backed store: one pretty-printed JSON document per analysis
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a results directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Resolves the document path for an id, rejecting path-unsafe ids
    fn path_for(&self, analysis_id: &str) -> Result<PathBuf, ResultsError> {
        if analysis_id.is_empty()
            || !analysis_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ResultsError::InvalidId(analysis_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", analysis_id)))
    }
}

impl ResultsStore for JsonFileStore {
    fn store(&self, analysis_id: &str, result: &CohesionResult) -> Result<(), ResultsError> {
        let path = self.path_for(analysis_id)?;
        let document = serde_json::to_string_pretty(result)?;
        std::fs::write(&path, document)?;
        tracing::debug!("Stored analysis {} at {}", analysis_id, path.display());
        Ok(())
    }

    fn load(&self, analysis_id: &str) -> Result<CohesionResult, ResultsError> {
        let path = self.path_for(analysis_id)?;
        let document = match std::fs::read_to_string(&path) {
            Ok(document) => document,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ResultsError::NotFound(analysis_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&document)?)
    }
}
