//! Logistic regression with optional feature standardisation.

use serde::Deserialize;

use crate::common::error::{PredictorError, PredictorResult};

use super::domain::{check_row, ArtefactHeader, Classifier, ModelKind};

/// Per-feature standardisation `(x - mean) / scale`.
#[derive(Clone, Debug, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogisticModel {
    #[serde(flatten)]
    pub header: ArtefactHeader,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn validate(&self) -> PredictorResult<()> {
        let n = self.header.n_features;
        if self.coefficients.len() != n {
            return Err(PredictorError::invalid_model(format!(
                "{} coefficients for {n} features",
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(PredictorError::invalid_model("coefficients must be finite"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PredictorError::invalid_model(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(PredictorError::invalid_model(format!(
                    "scaler has {} means and {} scales for {n} features",
                    scaler.mean.len(),
                    scaler.scale.len()
                )));
            }
            if scaler.mean.iter().any(|m| !m.is_finite()) {
                return Err(PredictorError::invalid_model("scaler means must be finite"));
            }
            if scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                return Err(PredictorError::invalid_model(
                    "scaler scales must be finite and non-zero",
                ));
            }
        }

        Ok(())
    }

    /// Linear decision function `w . x + b` on the (optionally scaled) row.
    pub fn decision(&self, row: &[f64]) -> f64 {
        let dot: f64 = match &self.scaler {
            Some(scaler) => row
                .iter()
                .zip(&self.coefficients)
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
                .sum(),
            None => row.iter().zip(&self.coefficients).map(|(x, w)| w * x).sum(),
        };
        dot + self.intercept
    }

    /// Probability of the positive class.
    pub fn probability(&self, row: &[f64]) -> PredictorResult<f64> {
        check_row(row, self.header.n_features)?;
        let z = self.decision(row);
        if !z.is_finite() {
            return Err(PredictorError::inference(format!(
                "decision function overflowed ({z})"
            )));
        }
        Ok(sigmoid(z))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Logistic
    }

    fn n_features(&self) -> usize {
        self.header.n_features
    }

    fn predict(&self, rows: &[Vec<f64>]) -> PredictorResult<Vec<f64>> {
        rows.iter()
            .map(|row| {
                let p = self.probability(row)?;
                let idx = usize::from(p >= self.threshold);
                Ok(self.header.classes[idx])
            })
            .collect()
    }
}
