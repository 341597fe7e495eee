//! Filesystem repository for the model artefact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::config::AppCfg;
use crate::common::error::{PredictorError, PredictorResult};

use super::domain::{LoadedModel, ModelArtefact, ModelInfo, ModelRepo};

/// Reads a single JSON artefact from a fixed path.
pub struct FsModelRepo {
    path: PathBuf,
}

impl FsModelRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(&cfg.model_path)
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// A missing file is `ModelMissing`; any other read failure is `Io`.
    fn read(&self) -> PredictorResult<String> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PredictorError::ModelMissing(self.path.clone()),
            _ => PredictorError::io(&self.path, e),
        })
    }
}

impl ModelRepo for FsModelRepo {
    fn load(&self) -> PredictorResult<LoadedModel> {
        let raw = self.read()?;
        let artefact: ModelArtefact = serde_json::from_str(&raw)
            .map_err(|e| PredictorError::invalid_model(format!("{}: {e}", self.path.display())))?;

        let info = ModelInfo {
            kind: artefact.kind(),
            version: artefact.header().version.clone(),
            artefact_path: self.path.clone(),
        };
        let classifier = artefact.into_classifier()?;

        Ok(LoadedModel { info, classifier })
    }
}
