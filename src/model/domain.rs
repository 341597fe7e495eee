//! Domain types for model artefacts and the inference contract.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::common::error::{PredictorError, PredictorResult};
use crate::inference::domain::{feature_names, FEATURE_COUNT};

use super::forest::ForestModel;
use super::linear::LogisticModel;

/// Supported model families.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModelKind {
    Logistic,
    Forest,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::Forest => "forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that maps feature rows to class labels.
///
/// Implementations are immutable after loading and shared across request
/// tasks, hence the `Send + Sync` bound.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Width every input row must have.
    fn n_features(&self) -> usize;

    /// Predict one label per row, in row order.
    fn predict(&self, rows: &[Vec<f64>]) -> PredictorResult<Vec<f64>>;
}

/// Fields shared by every artefact kind.
#[derive(Clone, Debug, Deserialize)]
pub struct ArtefactHeader {
    #[serde(default)]
    pub version: Option<String>,
    pub n_features: usize,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default = "default_classes")]
    pub classes: Vec<f64>,
}

fn default_classes() -> Vec<f64> {
    vec![0.0, 1.0]
}

impl ArtefactHeader {
    /// Check the header against the fixed request schema.
    pub fn validate(&self) -> PredictorResult<()> {
        if self.n_features != FEATURE_COUNT {
            return Err(PredictorError::invalid_model(format!(
                "n_features is {}, expected {FEATURE_COUNT}",
                self.n_features
            )));
        }

        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(feature_names()) {
                return Err(PredictorError::invalid_model(format!(
                    "feature_names {names:?} do not match the request schema order"
                )));
            }
        }

        if self.classes.len() != 2 {
            return Err(PredictorError::invalid_model(format!(
                "binary classifier needs exactly 2 classes, got {}",
                self.classes.len()
            )));
        }
        if self.classes.iter().any(|c| !c.is_finite()) {
            return Err(PredictorError::invalid_model("class labels must be finite"));
        }

        Ok(())
    }
}

/// On-disk artefact, tagged by `kind`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtefact {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

impl ModelArtefact {
    pub fn header(&self) -> &ArtefactHeader {
        match self {
            ModelArtefact::Logistic(m) => &m.header,
            ModelArtefact::Forest(m) => &m.header,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelArtefact::Logistic(_) => ModelKind::Logistic,
            ModelArtefact::Forest(_) => ModelKind::Forest,
        }
    }

    /// Validate the artefact and hand it out as a shareable classifier.
    pub fn into_classifier(self) -> PredictorResult<Arc<dyn Classifier>> {
        self.header().validate()?;
        match self {
            ModelArtefact::Logistic(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
            ModelArtefact::Forest(m) => {
                m.validate()?;
                Ok(Arc::new(m))
            }
        }
    }
}

/// Metadata describing the model that was loaded.
#[derive(Clone, Debug)]
pub struct ModelInfo {
    pub kind: ModelKind,
    pub version: Option<String>,
    pub artefact_path: PathBuf,
}

/// A validated classifier together with its metadata.
#[derive(Clone)]
pub struct LoadedModel {
    pub info: ModelInfo,
    pub classifier: Arc<dyn Classifier>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Repository contract for model artefacts.
pub trait ModelRepo {
    fn load(&self) -> PredictorResult<LoadedModel>;
}

/// Reject rows whose width or values the model cannot score.
pub(crate) fn check_row(row: &[f64], n_features: usize) -> PredictorResult<()> {
    if row.len() != n_features {
        return Err(PredictorError::inference(format!(
            "X has {} features, but the model is expecting {n_features} features as input",
            row.len()
        )));
    }
    if let Some(idx) = row.iter().position(|v| !v.is_finite()) {
        return Err(PredictorError::inference(format!(
            "input contains a non-finite value at feature {idx}"
        )));
    }
    Ok(())
}
