//! Fitted feature scalers.

use serde::{Deserialize, Serialize};

use crate::common::error::{OncoError, OncoResult};
use crate::features::FeatureSchema;

use super::domain::check_feature_names;

/// Per-column transform learned at training time.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`.
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    /// `x * scale + min`.
    MinMax {
        min: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

impl Scaler {
    pub fn name(&self) -> &'static str {
        match self {
            Scaler::Standard { .. } => "standard",
            Scaler::MinMax { .. } => "min_max",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { mean, .. } => mean.len(),
            Scaler::MinMax { min, .. } => min.len(),
        }
    }

    /// Scale one ordered sample.
    pub fn transform(&self, x: &[f64]) -> OncoResult<Vec<f64>> {
        if x.len() != self.n_features() {
            return Err(OncoError::prediction_failed(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                x.len()
            )));
        }

        let scaled: Vec<f64> = match self {
            Scaler::Standard { mean, scale, .. } => x
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(v, (m, s))| {
                    // Constant columns were fitted with a zero spread; leave them centred only.
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (v - m) / s
                })
                .collect(),
            Scaler::MinMax { min, scale, .. } => x
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(v, (lo, s))| v * s + lo)
                .collect(),
        };

        if let Some(pos) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(OncoError::prediction_failed(format!(
                "scaling produced a non-finite value at column {pos}"
            )));
        }
        Ok(scaled)
    }

    pub fn validate(&self, schema: &FeatureSchema) -> OncoResult<()> {
        let (offsets, scale, names) = match self {
            Scaler::Standard {
                mean,
                scale,
                feature_names,
            } => (mean, scale, feature_names),
            Scaler::MinMax {
                min,
                scale,
                feature_names,
            } => (min, scale, feature_names),
        };

        if offsets.len() != schema.len() || scale.len() != schema.len() {
            return Err(OncoError::startup(format!(
                "{} scaler covers {} features, configured feature set '{}' has {}",
                self.name(),
                offsets.len(),
                schema.set().as_str(),
                schema.len()
            )));
        }
        if offsets.iter().chain(scale).any(|v| !v.is_finite()) {
            return Err(OncoError::startup("scaler statistics must be finite"));
        }
        check_feature_names("scaler", names.as_deref(), schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::OncoCode;
    use crate::features::FeatureSet;

    #[test]
    fn standard_scaler_centres_and_divides() {
        let scaler = Scaler::Standard {
            mean: vec![10.0, 1.0, 5.0],
            scale: vec![2.0, 0.5, 0.0],
            feature_names: None,
        };
        let out = scaler.transform(&[14.0, 0.0, 7.0]).unwrap();
        assert_eq!(out, vec![2.0, -2.0, 2.0]);
    }

    #[test]
    fn min_max_scaler_applies_affine_map() {
        let scaler = Scaler::MinMax {
            min: vec![-0.5, 0.0],
            scale: vec![0.1, 2.0],
            feature_names: None,
        };
        let out = scaler.transform(&[10.0, 0.25]).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert_eq!(out[1], 0.5);
    }

    #[test]
    fn width_mismatch_is_a_prediction_fault() {
        let scaler = Scaler::Standard {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
            feature_names: None,
        };
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.code, OncoCode::PredictionFailed);
    }

    #[test]
    fn overflow_is_a_prediction_fault() {
        let scaler = Scaler::Standard {
            mean: vec![-1e308],
            scale: vec![1e-10],
            feature_names: None,
        };
        let err = scaler.transform(&[1e308]).unwrap_err();
        assert_eq!(err.code, OncoCode::PredictionFailed);
    }

    #[test]
    fn validate_checks_width_and_names() {
        let schema = FeatureSchema::new(FeatureSet::Selected);
        let good = Scaler::Standard {
            mean: vec![0.0; 19],
            scale: vec![1.0; 19],
            feature_names: Some(schema.names().iter().map(|n| n.to_string()).collect()),
        };
        good.validate(&schema).unwrap();

        let narrow = Scaler::Standard {
            mean: vec![0.0; 30],
            scale: vec![1.0; 30],
            feature_names: None,
        };
        assert_eq!(
            narrow.validate(&schema).unwrap_err().code,
            OncoCode::StartupFailure
        );

        let mut names: Vec<String> = schema.names().iter().map(|n| n.to_string()).collect();
        names.reverse();
        let shuffled = Scaler::Standard {
            mean: vec![0.0; 19],
            scale: vec![1.0; 19],
            feature_names: Some(names),
        };
        assert!(shuffled.validate(&schema).is_err());
    }

    #[test]
    fn parses_tagged_json() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "standard", "mean": [1.0], "scale": [2.0]}"#).unwrap();
        assert_eq!(scaler.name(), "standard");
        assert_eq!(scaler.transform(&[3.0]).unwrap(), vec![1.0]);
    }
}
