// lib.rs - heart disease prediction service
//! The model artefact is read from `HEART_MODEL_PATH` when set. Otherwise the
//! service looks for `heart_model.json` beside its executable and then for
//! `models/heart_model.json` under the working directory, so `cargo run` from
//! the repository root picks up the bundled artefact.

pub mod api;
pub mod common;
pub mod inference;
pub mod model;

pub use common::{PredictorError, PredictorResult};
