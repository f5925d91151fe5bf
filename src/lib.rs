// lib.rs - service wiring
pub mod api;
pub mod common;
pub mod features;
pub mod inference;
pub mod model;

pub use common::{OncoCode, OncoError, OncoResult};
pub use inference::{Prediction, PredictionService};
