//! Domain definitions for prediction results.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::model::ImportanceSource;

/// Diagnosis label derived from the classifier's class code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Label {
    Malignant,
    Benign,
}

impl Label {
    /// Class code `1` is malignant; anything else is benign.
    pub fn from_class(code: u8) -> Self {
        if code == 1 {
            Label::Malignant
        } else {
            Label::Benign
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Malignant => "Malignant",
            Label::Benign => "Benign",
        }
    }
}

/// Feature name → importance, kept in canonical column order.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureImportances(Vec<(&'static str, f64)>);

impl FeatureImportances {
    pub fn new(names: &'static [&'static str], scores: &[f64]) -> Self {
        Self(names.iter().copied().zip(scores.iter().copied()).collect())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `k` highest scoring features, strongest first.
    pub fn top(&self, k: usize) -> Vec<(&'static str, f64)> {
        let mut ranked = self.0.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

impl Serialize for FeatureImportances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, score) in &self.0 {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

/// Result of a single prediction; serializes to the public response body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: Label,
    /// Probability of the malignant class.
    pub probability: f64,
    #[serde(rename = "feature_importances")]
    pub importances: FeatureImportances,
    #[serde(skip)]
    pub importance_source: ImportanceSource,
    /// Features filled with `0.0` under the lenient policy.
    #[serde(skip)]
    pub defaulted: Vec<&'static str>,
}
