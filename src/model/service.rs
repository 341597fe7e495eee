//! Startup-time model loading.

use std::time::Instant;

use tracing::{error, info};

use crate::common::config::AppCfg;
use crate::common::error::PredictorResult;
use crate::common::log::elapsed_ms;

use super::domain::{LoadedModel, ModelRepo};
use super::repo_fs::FsModelRepo;

/// Load the artefact named by `cfg`. Any error here must abort startup.
pub fn load_model(cfg: &AppCfg) -> PredictorResult<LoadedModel> {
    load_from(&FsModelRepo::new(cfg))
}

/// Load through an arbitrary repository, logging the outcome.
pub fn load_from(repo: &dyn ModelRepo) -> PredictorResult<LoadedModel> {
    let start = Instant::now();
    match repo.load() {
        Ok(model) => {
            info!(
                ev = "model_loaded",
                path = %model.info.artefact_path.display(),
                kind = %model.info.kind,
                version = model.info.version.as_deref().unwrap_or("unversioned"),
                dur_ms = elapsed_ms(start),
                "model artefact loaded"
            );
            Ok(model)
        }
        Err(err) => {
            error!(ev = "model_load_failed", code = err.code().raw(), error = %err);
            Err(err)
        }
    }
}
