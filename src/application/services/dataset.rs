//! Dataset snapshot loading
//!
//! Reads the JSON snapshot of languages, parameters, value sets and the
//! stored phylogeny, plus bare Newick files for the tree commands.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::Dataset;
use crate::infrastructure::traits::FileSystem;

/// Service for reading dataset snapshots and tree files.
pub struct DatasetService {
    fs: Arc<dyn FileSystem>,
}

impl DatasetService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn ensure_file(&self, path: &Path) -> ApplicationResult<()> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::Dataset {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        if !self.fs.is_file(path) {
            return Err(ApplicationError::Dataset {
                path: path.to_path_buf(),
                message: "not a file".to_string(),
            });
        }
        Ok(())
    }

    /// Load a dataset snapshot from JSON.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Dataset> {
        self.ensure_file(path)?;
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read dataset", path)?;
        let dataset: Dataset =
            serde_json::from_str(&content).map_err(|e| ApplicationError::Dataset {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            "loaded dataset: {} languages, {} parameters, {} value sets",
            dataset.languages.len(),
            dataset.parameters.len(),
            dataset.valuesets.len()
        );
        Ok(dataset)
    }

    /// Read raw Newick text. Syntax is checked only when the tree is used.
    #[instrument(level = "debug", skip(self))]
    pub fn read_tree(&self, path: &Path) -> ApplicationResult<String> {
        self.ensure_file(path)?;
        self.fs
            .read_to_string(path)
            .with_path_context("read tree", path)
    }
}
