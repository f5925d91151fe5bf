//! Inference domain: the single synchronous prediction operation.

pub mod domain;
pub mod service;

pub use domain::{FeatureImportances, Label, Prediction};
pub use service::PredictionService;
