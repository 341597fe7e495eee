//! Inference domain: request schema and the synchronous prediction call.

pub mod domain;
pub mod service;

pub use domain::{FieldError, Prediction, PredictionRequest};
