//! Canonical feature sets and the policies applied to incoming payloads.
//!
//! The order of each set is the column order the scaler and classifier were
//! fitted with, so it must never be rearranged.

/// The 30 Wisconsin diagnostic measurements in training column order.
pub const FULL_FEATURES: [&str; 30] = [
    "mean_radius",
    "mean_texture",
    "mean_perimeter",
    "mean_area",
    "mean_smoothness",
    "mean_compactness",
    "mean_concavity",
    "mean_concave_points",
    "mean_symmetry",
    "mean_fractal_dimension",
    "radius_error",
    "texture_error",
    "perimeter_error",
    "area_error",
    "smoothness_error",
    "compactness_error",
    "concavity_error",
    "concave_points_error",
    "symmetry_error",
    "fractal_dimension_error",
    "worst_radius",
    "worst_texture",
    "worst_perimeter",
    "worst_area",
    "worst_smoothness",
    "worst_compactness",
    "worst_concavity",
    "worst_concave_points",
    "worst_symmetry",
    "worst_fractal_dimension",
];

/// Reduced set picked by feature selection, most informative first.
pub const SELECTED_FEATURES: [&str; 19] = [
    "worst_radius",
    "worst_perimeter",
    "worst_concave_points",
    "mean_concave_points",
    "worst_area",
    "worst_compactness",
    "mean_radius",
    "texture_error",
    "worst_texture",
    "area_error",
    "mean_smoothness",
    "mean_symmetry",
    "worst_smoothness",
    "worst_symmetry",
    "mean_concavity",
    "worst_concavity",
    "compactness_error",
    "concavity_error",
    "fractal_dimension_error",
];

/// Which canonical list the loaded artefacts were trained on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FeatureSet {
    #[default]
    Full,
    Selected,
}

impl FeatureSet {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" | "30" => Some(FeatureSet::Full),
            "selected" | "19" => Some(FeatureSet::Selected),
            _ => None,
        }
    }

    pub fn names(self) -> &'static [&'static str] {
        match self {
            FeatureSet::Full => &FULL_FEATURES,
            FeatureSet::Selected => &SELECTED_FEATURES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureSet::Full => "full",
            FeatureSet::Selected => "selected",
        }
    }
}

/// What to do when a canonical feature is absent from the payload.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MissingPolicy {
    /// Reject the request and name every absent feature.
    #[default]
    Strict,
    /// Substitute `0.0` and carry on.
    Lenient,
}

impl MissingPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(MissingPolicy::Strict),
            "lenient" => Some(MissingPolicy::Lenient),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MissingPolicy::Strict => "strict",
            MissingPolicy::Lenient => "lenient",
        }
    }
}

/// Immutable name → column mapping for one feature set.
#[derive(Clone, Debug)]
pub struct FeatureSchema {
    set: FeatureSet,
    names: &'static [&'static str],
}

impl FeatureSchema {
    pub fn new(set: FeatureSet) -> Self {
        Self {
            set,
            names: set.names(),
        }
    }

    pub fn set(&self) -> FeatureSet {
        self.set
    }

    /// Canonical names in column order.
    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column index for a canonical name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| *n == name)
    }

    /// Check an artefact's recorded column names against this schema.
    pub fn matches(&self, other: &[String]) -> bool {
        other.len() == self.names.len()
            && other
                .iter()
                .zip(self.names)
                .all(|(theirs, ours)| canonical_key(theirs) == *ours)
    }
}

/// Spelling used at training time ("worst radius") mapped to the canonical
/// underscore form ("worst_radius").
pub fn canonical_key(raw: &str) -> String {
    raw.trim().replace(' ', "_")
}

/// Ordered, fully numeric feature vector ready for scaling.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    /// Canonical names that were absent and defaulted under the lenient policy.
    pub defaulted: Vec<&'static str>,
}
