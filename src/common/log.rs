//! Logging setup built on `tracing`.
//!
//! Records carry the structured fields `ev`, `code` and `dur_ms` so JSON output
//! can be filtered by event name downstream.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use super::config::{AppCfg, LogFormat};
use super::error::{PredictorError, PredictorResult};

/// Install the global subscriber described by `cfg`.
pub fn init(cfg: &AppCfg) -> PredictorResult<()> {
    let filter = EnvFilter::try_new(&cfg.log_filter).map_err(|e| {
        PredictorError::config(format!("HEART_LOG `{}`: {e}", cfg.log_filter))
    })?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = match cfg.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    installed.map_err(|e| PredictorError::config(format!("logging already initialised: {e}")))
}

/// Milliseconds elapsed since `start`, saturating into `u64`.
pub fn elapsed_ms(start: std::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
