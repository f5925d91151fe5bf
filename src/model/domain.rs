//! Domain types shared by the classifier and scaler artefacts.

use crate::common::error::{OncoError, OncoResult};
use crate::features::FeatureSchema;

use super::classifier::Classifier;
use super::scaler::Scaler;

/// Model families the service knows how to explain.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModelKind {
    TreeEnsemble,
    Linear,
    Other,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::TreeEnsemble => "tree_ensemble",
            ModelKind::Linear => "linear",
            ModelKind::Other => "other",
        }
    }
}

/// Where a set of importance scores came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImportanceSource {
    /// Impurity-based importances recorded by the tree ensemble.
    Native,
    /// Absolute linear coefficients.
    Coefficients,
    /// `1/N` for every feature; the model offers nothing better.
    UniformPlaceholder,
}

impl ImportanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportanceSource::Native => "native",
            ImportanceSource::Coefficients => "coefficients",
            ImportanceSource::UniformPlaceholder => "uniform_placeholder",
        }
    }
}

/// A deserialized artefact plus the fingerprint of the bytes it came from.
#[derive(Clone, Debug)]
pub struct Artefact<T> {
    pub value: T,
    pub path: String,
    pub digest: String,
}

/// Classifier and scaler, validated against one feature schema.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub classifier: Classifier,
    pub scaler: Scaler,
    pub classifier_digest: String,
    pub scaler_digest: String,
}

/// Repository contract for trained artefacts.
pub trait ArtefactRepo {
    fn load_classifier(&self) -> OncoResult<Artefact<Classifier>>;
    fn load_scaler(&self) -> OncoResult<Artefact<Scaler>>;
}

/// When an artefact recorded its training columns, they must match ours exactly.
pub fn check_feature_names(
    what: &str,
    names: Option<&[String]>,
    schema: &FeatureSchema,
) -> OncoResult<()> {
    match names {
        Some(names) if !schema.matches(names) => Err(OncoError::startup(format!(
            "{what} was trained on columns that differ from the '{}' feature set",
            schema.set().as_str()
        ))),
        _ => Ok(()),
    }
}
