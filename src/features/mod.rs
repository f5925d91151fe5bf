//! Feature domain: canonical column orders and payload validation.

pub mod domain;
pub mod service;

pub use domain::{FeatureSchema, FeatureSet, FeatureVector, MissingPolicy};
pub use service::{order_features, RawFeatures};
