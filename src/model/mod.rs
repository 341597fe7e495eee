//! Model domain: artefact format, classifiers and loading.

pub mod domain;
pub mod forest;
pub mod linear;
pub mod repo_fs;
pub mod service;

pub use domain::{Classifier, LoadedModel, ModelInfo, ModelKind};
