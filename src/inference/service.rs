//! Inference orchestration bridging validated requests and the loaded model.

use std::time::Instant;

use tracing::debug;

use crate::common::error::{PredictorError, PredictorResult};
use crate::common::log::elapsed_ms;
use crate::model::Classifier;

use super::domain::{Prediction, PredictionRequest};

/// Perform a single inference call using the provided model.
///
/// The request becomes a one-row batch; the first label of the result is
/// coerced to an integer.
pub fn infer(model: &dyn Classifier, request: &PredictionRequest) -> PredictorResult<Prediction> {
    let start = Instant::now();
    let rows = [request.to_row()];

    let labels = model.predict(&rows)?;
    let first = labels
        .first()
        .copied()
        .ok_or_else(|| PredictorError::inference("model returned no prediction"))?;
    let label = label_to_int(first)?;

    let latency_ms = elapsed_ms(start);
    debug!(ev = "infer", kind = %model.kind(), label, dur_ms = latency_ms);

    Ok(Prediction { label, latency_ms })
}

fn label_to_int(label: f64) -> PredictorResult<i64> {
    if !label.is_finite() {
        return Err(PredictorError::inference(format!(
            "cannot convert label {label} to integer"
        )));
    }
    if label < i64::MIN as f64 || label >= i64::MAX as f64 {
        return Err(PredictorError::inference(format!(
            "label {label} is out of integer range"
        )));
    }
    // Truncates toward zero, matching int() on a float label.
    Ok(label.trunc() as i64)
}
