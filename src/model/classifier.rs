//! Classifier artefacts, one variant per model family.
//!
//! Each family answers `predict`, `predict_proba` and "feature importances"
//! through the same methods so callers never probe for capabilities.

use serde::{Deserialize, Serialize};

use crate::common::error::{OncoError, OncoResult};
use crate::features::FeatureSchema;

use super::domain::{check_feature_names, ImportanceSource, ModelKind};

/// Trained binary classifier as exported from the training pipeline.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
    GaussianNb(GaussianNb),
}

impl Classifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::TreeEnsemble(_) => ModelKind::TreeEnsemble,
            Classifier::Linear(_) => ModelKind::Linear,
            Classifier::GaussianNb(_) => ModelKind::Other,
        }
    }

    /// Human readable family name for logs.
    pub fn family(&self) -> &'static str {
        match self {
            Classifier::TreeEnsemble(t) => match t.aggregation {
                Aggregation::Average => "random_forest",
                Aggregation::Boosting { .. } => "gradient_boosting",
            },
            Classifier::Linear(_) => "logistic_regression",
            Classifier::GaussianNb(_) => "gaussian_nb",
        }
    }

    /// Number of input columns the model was fitted on.
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::TreeEnsemble(t) => t.feature_importances.len(),
            Classifier::Linear(l) => l.coefficients.len(),
            Classifier::GaussianNb(nb) => nb.theta[0].len(),
        }
    }

    /// Whether the artefact can answer predictions at all.
    pub fn can_predict(&self) -> bool {
        let populated = match self {
            Classifier::TreeEnsemble(t) => !t.trees.is_empty(),
            Classifier::Linear(_) | Classifier::GaussianNb(_) => true,
        };
        populated && self.n_features() > 0
    }

    /// `[P(benign), P(malignant)]` for one scaled sample.
    pub fn predict_proba(&self, x: &[f64]) -> OncoResult<[f64; 2]> {
        if x.len() != self.n_features() {
            return Err(OncoError::prediction_failed(format!(
                "classifier expects {} features, got {}",
                self.n_features(),
                x.len()
            )));
        }

        let p1 = match self {
            Classifier::TreeEnsemble(t) => t.positive_probability(x)?,
            Classifier::Linear(l) => sigmoid(l.decision(x)),
            Classifier::GaussianNb(nb) => nb.positive_probability(x),
        };

        if !p1.is_finite() {
            return Err(OncoError::prediction_failed(
                "classifier produced a non-finite probability",
            ));
        }
        let p1 = p1.clamp(0.0, 1.0);
        Ok([1.0 - p1, p1])
    }

    /// Class code: `1` when the positive class is strictly more likely.
    pub fn predict(&self, x: &[f64]) -> OncoResult<u8> {
        let [p0, p1] = self.predict_proba(x)?;
        Ok(u8::from(p1 > p0))
    }

    /// Per-column importance scores and where they came from.
    ///
    /// Families without a native notion of importance get a uniform `1/N`
    /// placeholder; it carries no statistical meaning.
    pub fn feature_importances(&self) -> (Vec<f64>, ImportanceSource) {
        match self {
            Classifier::TreeEnsemble(t) => (t.feature_importances.clone(), ImportanceSource::Native),
            Classifier::Linear(l) => (
                l.coefficients.iter().map(|c| c.abs()).collect(),
                ImportanceSource::Coefficients,
            ),
            Classifier::GaussianNb(_) => {
                let n = self.n_features();
                (vec![1.0 / n as f64; n], ImportanceSource::UniformPlaceholder)
            }
        }
    }

    /// Structural checks run once at load time.
    pub fn validate(&self, schema: &FeatureSchema) -> OncoResult<()> {
        let n = schema.len();
        if self.n_features() != n {
            return Err(OncoError::startup(format!(
                "{} classifier was fitted on {} features, configured feature set '{}' has {}",
                self.family(),
                self.n_features(),
                schema.set().as_str(),
                n
            )));
        }

        match self {
            Classifier::TreeEnsemble(t) => {
                check_feature_names("classifier", t.feature_names.as_deref(), schema)?;
                t.validate(n)
            }
            Classifier::Linear(l) => {
                check_feature_names("classifier", l.feature_names.as_deref(), schema)?;
                if !l.intercept.is_finite() || l.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(OncoError::startup("linear coefficients must be finite"));
                }
                Ok(())
            }
            Classifier::GaussianNb(nb) => {
                check_feature_names("classifier", nb.feature_names.as_deref(), schema)?;
                nb.validate(n)
            }
        }
    }
}

/// How per-tree outputs are combined.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Aggregation {
    /// Leaves hold P(class 1); the ensemble averages them.
    #[default]
    Average,
    /// Leaves hold log-odds contributions summed on top of `base_score`.
    Boosting { base_score: f64, learning_rate: f64 },
}

/// Random forest or gradient boosted trees.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TreeEnsemble {
    pub trees: Vec<DecisionTree>,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub feature_importances: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

/// Flat node array; node `0` is the root.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go `left` when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl DecisionTree {
    fn evaluate(&self, x: &[f64]) -> OncoResult<f64> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        OncoError::prediction_failed(format!("tree split on unknown feature {feature}"))
                    })?;
                    idx = if v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(OncoError::prediction_failed(format!(
                        "tree references missing node {idx}"
                    )))
                }
            }
        }
        Err(OncoError::prediction_failed("tree walk did not terminate"))
    }

    fn validate(&self, n_features: usize) -> OncoResult<()> {
        if self.nodes.is_empty() {
            return Err(OncoError::startup("decision tree has no nodes"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(OncoError::startup(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(OncoError::startup(format!("node {idx} has a NaN threshold")));
                    }
                    // Children are stored after their parent, which also rules out cycles.
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(OncoError::startup(format!(
                                "node {idx} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(OncoError::startup(format!("leaf {idx} is not finite")));
                    }
                }
            }
        }
        Ok(())
    }
}

impl TreeEnsemble {
    fn positive_probability(&self, x: &[f64]) -> OncoResult<f64> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(x)?;
        }
        Ok(match self.aggregation {
            Aggregation::Average => total / self.trees.len() as f64,
            Aggregation::Boosting {
                base_score,
                learning_rate,
            } => sigmoid(base_score + learning_rate * total),
        })
    }

    fn validate(&self, n_features: usize) -> OncoResult<()> {
        if self.trees.is_empty() {
            return Err(OncoError::startup("tree ensemble has no trees"));
        }
        if self
            .feature_importances
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(OncoError::startup(
                "feature importances must be finite and non-negative",
            ));
        }
        for tree in &self.trees {
            tree.validate(n_features)?;
            if matches!(self.aggregation, Aggregation::Average) {
                let out_of_range = tree.nodes.iter().any(
                    |node| matches!(node, TreeNode::Leaf { value } if !(0.0..=1.0).contains(value)),
                );
                if out_of_range {
                    return Err(OncoError::startup(
                        "averaged tree leaves must hold probabilities in [0, 1]",
                    ));
                }
            }
        }
        if let Aggregation::Boosting {
            base_score,
            learning_rate,
        } = self.aggregation
        {
            if !base_score.is_finite() || !learning_rate.is_finite() {
                return Err(OncoError::startup("boosting parameters must be finite"));
            }
        }
        Ok(())
    }
}

/// Logistic regression.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    fn decision(&self, x: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept
    }
}

/// Gaussian naive Bayes: per-class feature means and variances.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GaussianNb {
    pub class_prior: [f64; 2],
    pub theta: [Vec<f64>; 2],
    pub var: [Vec<f64>; 2],
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl GaussianNb {
    fn joint_log_likelihood(&self, class: usize, x: &[f64]) -> f64 {
        let mut jll = self.class_prior[class].ln();
        for ((v, mean), var) in x.iter().zip(&self.theta[class]).zip(&self.var[class]) {
            jll -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
            jll -= 0.5 * (v - mean).powi(2) / var;
        }
        jll
    }

    fn positive_probability(&self, x: &[f64]) -> f64 {
        let j0 = self.joint_log_likelihood(0, x);
        let j1 = self.joint_log_likelihood(1, x);
        // Softmax over two classes, written to avoid overflowing exp().
        sigmoid(j1 - j0)
    }

    fn validate(&self, n_features: usize) -> OncoResult<()> {
        for class in 0..2 {
            if self.theta[class].len() != n_features || self.var[class].len() != n_features {
                return Err(OncoError::startup(format!(
                    "naive bayes class {class} statistics do not cover {n_features} features"
                )));
            }
            if self.var[class].iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(OncoError::startup("naive bayes variances must be positive"));
            }
            if self.theta[class].iter().any(|v| !v.is_finite()) {
                return Err(OncoError::startup("naive bayes means must be finite"));
            }
        }
        if self
            .class_prior
            .iter()
            .any(|p| !p.is_finite() || *p <= 0.0 || *p >= 1.0)
        {
            return Err(OncoError::startup("class priors must lie strictly between 0 and 1"));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::OncoCode;
    use crate::features::FeatureSet;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    fn forest(n: usize) -> Classifier {
        let mut importances = vec![0.0; n];
        importances[0] = 0.75;
        importances[1] = 0.25;
        Classifier::TreeEnsemble(TreeEnsemble {
            trees: vec![stump(0, 0.0, 0.1, 0.9), stump(1, 0.0, 0.2, 0.7)],
            aggregation: Aggregation::Average,
            feature_importances: importances,
            feature_names: None,
        })
    }

    #[test]
    fn forest_averages_leaf_probabilities() {
        let model = forest(3);
        let [p0, p1] = model.predict_proba(&[1.0, -1.0, 0.0]).unwrap();
        assert!((p1 - 0.55).abs() < 1e-12);
        assert!((p0 - 0.45).abs() < 1e-12);
        assert_eq!(model.predict(&[1.0, -1.0, 0.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-1.0, -1.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn boosting_sums_margins_through_logistic() {
        let model = Classifier::TreeEnsemble(TreeEnsemble {
            trees: vec![stump(0, 0.0, -1.0, 1.0), stump(0, 0.5, -1.0, 1.0)],
            aggregation: Aggregation::Boosting {
                base_score: 0.0,
                learning_rate: 0.5,
            },
            feature_importances: vec![1.0],
            feature_names: None,
        });
        let [_, p1] = model.predict_proba(&[1.0]).unwrap();
        assert!((p1 - sigmoid(1.0)).abs() < 1e-12);
        let [_, p1] = model.predict_proba(&[0.25]).unwrap();
        assert!((p1 - 0.5).abs() < 1e-12);
        // Ties go to the negative class.
        assert_eq!(model.predict(&[0.25]).unwrap(), 0);
    }

    #[test]
    fn linear_probability_is_logistic_of_decision() {
        let model = Classifier::Linear(LinearModel {
            coefficients: vec![2.0, -1.0],
            intercept: 0.5,
            feature_names: None,
        });
        let [_, p1] = model.predict_proba(&[1.0, 1.0]).unwrap();
        assert!((p1 - sigmoid(1.5)).abs() < 1e-12);
        let (importances, source) = model.feature_importances();
        assert_eq!(importances, vec![2.0, 1.0]);
        assert_eq!(source, ImportanceSource::Coefficients);
    }

    #[test]
    fn naive_bayes_prefers_the_closer_class() {
        let model = Classifier::GaussianNb(GaussianNb {
            class_prior: [0.6, 0.4],
            theta: [vec![0.0, 0.0], vec![3.0, 3.0]],
            var: [vec![1.0, 1.0], vec![1.0, 1.0]],
            feature_names: None,
        });
        assert_eq!(model.predict(&[2.9, 3.1]).unwrap(), 1);
        assert_eq!(model.predict(&[0.1, -0.2]).unwrap(), 0);

        let (importances, source) = model.feature_importances();
        assert_eq!(importances, vec![0.5, 0.5]);
        assert_eq!(source, ImportanceSource::UniformPlaceholder);
        assert_eq!(model.kind(), ModelKind::Other);
    }

    #[test]
    fn probabilities_stay_in_unit_interval_for_extreme_inputs() {
        let model = Classifier::Linear(LinearModel {
            coefficients: vec![1e6],
            intercept: 0.0,
            feature_names: None,
        });
        for x in [1e300, -1e300, 0.0] {
            let [p0, p1] = model.predict_proba(&[x]).unwrap();
            assert!((0.0..=1.0).contains(&p1));
            assert!((p0 + p1 - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn non_finite_decision_is_a_prediction_fault() {
        let model = Classifier::Linear(LinearModel {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
            feature_names: None,
        });
        let err = model.predict_proba(&[f64::INFINITY, f64::NEG_INFINITY]).unwrap_err();
        assert_eq!(err.code, OncoCode::PredictionFailed);
    }

    #[test]
    fn wrong_width_is_a_prediction_fault() {
        let err = forest(3).predict_proba(&[1.0]).unwrap_err();
        assert_eq!(err.code, OncoCode::PredictionFailed);
    }

    #[test]
    fn validate_rejects_dimension_mismatch() {
        let schema = FeatureSchema::new(FeatureSet::Selected);
        let err = forest(30).validate(&schema).unwrap_err();
        assert_eq!(err.code, OncoCode::StartupFailure);
        assert!(err.to_string().contains("19"));
        forest(19).validate(&schema).unwrap();
    }

    #[test]
    fn validate_rejects_backward_child_links() {
        let schema = FeatureSchema::new(FeatureSet::Selected);
        let mut importances = vec![0.0; 19];
        importances[0] = 1.0;
        let model = Classifier::TreeEnsemble(TreeEnsemble {
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 1,
                    },
                    TreeNode::Leaf { value: 0.5 },
                ],
            }],
            aggregation: Aggregation::Average,
            feature_importances: importances,
            feature_names: None,
        });
        assert!(model.validate(&schema).is_err());
    }

    #[test]
    fn artefact_json_uses_kind_tags() {
        let raw = r#"{
            "kind": "tree_ensemble",
            "aggregation": {"method": "boosting", "base_score": -0.2, "learning_rate": 0.1},
            "feature_importances": [1.0],
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"value": -0.4},
                {"value": 0.6}
            ]}]
        }"#;
        let model: Classifier = serde_json::from_str(raw).unwrap();
        assert_eq!(model.kind(), ModelKind::TreeEnsemble);
        assert_eq!(model.family(), "gradient_boosting");
        assert!(model.can_predict());

        let linear: Classifier =
            serde_json::from_str(r#"{"kind": "linear", "coefficients": [0.3], "intercept": 0.0}"#)
                .unwrap();
        assert_eq!(linear.kind(), ModelKind::Linear);
    }
}
