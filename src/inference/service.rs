//! Prediction orchestration: validate, order, scale, classify, explain.

use serde_json::Value;
use tracing::{debug, warn};

use crate::common::config::AppCfg;
use crate::common::error::{OncoCode, OncoError, OncoResult};
use crate::common::log;
use crate::common::time;
use crate::features::{order_features, FeatureSchema, MissingPolicy, RawFeatures};
use crate::model::{load_model, ArtefactRepo, LoadedModel};

use super::domain::{FeatureImportances, Label, Prediction};

/// Immutable service context built once at startup and shared by every request.
#[derive(Debug)]
pub struct PredictionService {
    schema: FeatureSchema,
    policy: MissingPolicy,
    model: LoadedModel,
}

impl PredictionService {
    pub fn new(schema: FeatureSchema, policy: MissingPolicy, model: LoadedModel) -> Self {
        Self {
            schema,
            policy,
            model,
        }
    }

    /// Load artefacts through `repo` and wire them to the configured policies.
    pub fn from_config(cfg: &AppCfg, repo: &dyn ArtefactRepo) -> OncoResult<Self> {
        let schema = FeatureSchema::new(cfg.feature_set);
        let model = load_model(repo, &schema)?;
        Ok(Self::new(schema, cfg.missing_policy, model))
    }

    /// Canonical feature order clients must supply.
    pub fn feature_names(&self) -> &'static [&'static str] {
        self.schema.names()
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    /// Whether the classifier can answer predictions.
    pub fn model_loaded(&self) -> bool {
        self.model.classifier.can_predict()
    }

    /// Unwrap a `{"features": {...}}` request body and predict.
    pub fn predict_payload(&self, body: Option<&Value>) -> OncoResult<Prediction> {
        let features = body
            .and_then(Value::as_object)
            .and_then(|envelope| envelope.get("features"))
            .and_then(Value::as_object);

        match features {
            Some(raw) => self.predict(raw),
            None => {
                let err = OncoError::missing_input("Missing features data");
                log::log_event("inference", "predict", err.code as u32, 0);
                Err(err)
            }
        }
    }

    /// Run one prediction over a raw feature mapping.
    pub fn predict(&self, raw: &RawFeatures) -> OncoResult<Prediction> {
        let start = time::now_ms();
        let result = self.run(raw);
        let dur_ms = time::since_ms(start);

        match &result {
            Ok(prediction) => {
                if !prediction.defaulted.is_empty() {
                    warn!(
                        module = "inference",
                        ev = "features_defaulted",
                        defaulted = ?prediction.defaulted,
                        "missing features substituted with 0.0"
                    );
                }
                debug!(
                    module = "inference",
                    label = prediction.label.as_str(),
                    probability = prediction.probability,
                    importance_source = prediction.importance_source.as_str(),
                    top = ?prediction.importances.top(3),
                );
                log::log_event("inference", "predict", OncoCode::Ok as u32, dur_ms);
            }
            Err(err) if err.code.is_client_error() => {
                warn!(module = "inference", ev = "rejected", code = err.code.as_str(), error = %err);
                log::log_event("inference", "predict", err.code as u32, dur_ms);
            }
            Err(err) => {
                tracing::error!(module = "inference", ev = "fault", error = %err);
                log::log_event("inference", "predict", err.code as u32, dur_ms);
            }
        }
        result
    }

    fn run(&self, raw: &RawFeatures) -> OncoResult<Prediction> {
        let vector = order_features(&self.schema, self.policy, raw)?;
        let scaled = self.model.scaler.transform(&vector.values)?;

        let classifier = &self.model.classifier;
        let class = classifier.predict(&scaled)?;
        let [_, p1] = classifier.predict_proba(&scaled)?;

        let (scores, importance_source) = classifier.feature_importances();
        if scores.len() != self.schema.len() {
            return Err(OncoError::prediction_failed(
                "importance vector does not match the feature set",
            ));
        }

        Ok(Prediction {
            label: Label::from_class(class),
            probability: p1,
            importances: FeatureImportances::new(self.schema.names(), &scores),
            importance_source,
            defaulted: vector.defaulted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSet;
    use crate::model::classifier::{
        Aggregation, Classifier, DecisionTree, GaussianNb, LinearModel, TreeEnsemble, TreeNode,
    };
    use crate::model::{ImportanceSource, Scaler};
    use serde_json::json;

    const N: usize = 30;

    fn identity_scaler(n: usize) -> Scaler {
        Scaler::Standard {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
            feature_names: None,
        }
    }

    fn service_with(classifier: Classifier, policy: MissingPolicy) -> PredictionService {
        let schema = FeatureSchema::new(FeatureSet::Full);
        let model = LoadedModel {
            classifier,
            scaler: identity_scaler(N),
            classifier_digest: "test".into(),
            scaler_digest: "test".into(),
        };
        PredictionService::new(schema, policy, model)
    }

    /// Malignant whenever mean_radius > 15.
    fn linear_on_radius() -> Classifier {
        let mut coefficients = vec![0.0; N];
        coefficients[0] = 1.0;
        Classifier::Linear(LinearModel {
            coefficients,
            intercept: -15.0,
            feature_names: None,
        })
    }

    fn forest_on_worst_area() -> Classifier {
        let mut importances = vec![0.0; N];
        importances[23] = 1.0;
        Classifier::TreeEnsemble(TreeEnsemble {
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 23,
                        threshold: 880.0,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 0.05 },
                    TreeNode::Leaf { value: 0.95 },
                ],
            }],
            aggregation: Aggregation::Average,
            feature_importances: importances,
            feature_names: None,
        })
    }

    fn payload(radius: f64) -> RawFeatures {
        let mut raw: RawFeatures = FeatureSet::Full
            .names()
            .iter()
            .map(|name| (name.to_string(), json!(0.1)))
            .collect();
        raw.insert("mean_radius".into(), json!(radius));
        raw.insert("worst_area".into(), json!(radius * 60.0));
        raw
    }

    #[test]
    fn valid_input_yields_label_probability_and_full_importance_map() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        let prediction = svc.predict(&payload(20.0)).unwrap();

        assert_eq!(prediction.label, Label::Malignant);
        assert!((0.0..=1.0).contains(&prediction.probability));
        assert!(prediction.probability > 0.99);
        let keys: Vec<&str> = prediction.importances.names().collect();
        assert_eq!(keys, FeatureSet::Full.names());
        assert_eq!(prediction.importances.get("mean_radius"), Some(1.0));
        assert_eq!(prediction.importance_source, ImportanceSource::Coefficients);

        let benign = svc.predict(&payload(10.0)).unwrap();
        assert_eq!(benign.label, Label::Benign);
        assert!(benign.probability < 0.01);
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let svc = service_with(forest_on_worst_area(), MissingPolicy::Strict);
        let raw = payload(17.0);
        assert_eq!(svc.predict(&raw).unwrap(), svc.predict(&raw).unwrap());
    }

    #[test]
    fn tree_ensemble_reports_native_importances() {
        let svc = service_with(forest_on_worst_area(), MissingPolicy::Strict);
        let prediction = svc.predict(&payload(17.0)).unwrap();
        assert_eq!(prediction.label, Label::Malignant);
        assert_eq!(prediction.probability, 0.95);
        assert_eq!(prediction.importance_source, ImportanceSource::Native);
        assert_eq!(prediction.importances.get("worst_area"), Some(1.0));
        assert_eq!(prediction.importances.get("mean_radius"), Some(0.0));
    }

    #[test]
    fn other_family_falls_back_to_uniform_placeholder() {
        let nb = Classifier::GaussianNb(GaussianNb {
            class_prior: [0.63, 0.37],
            theta: [vec![0.0; N], vec![1.0; N]],
            var: [vec![1.0; N], vec![1.0; N]],
            feature_names: None,
        });
        let svc = service_with(nb, MissingPolicy::Strict);
        let prediction = svc.predict(&payload(12.0)).unwrap();
        assert_eq!(prediction.importance_source, ImportanceSource::UniformPlaceholder);
        assert_eq!(prediction.importances.len(), N);
        assert_eq!(prediction.importances.get("worst_symmetry"), Some(1.0 / N as f64));
    }

    #[test]
    fn strict_policy_rejects_missing_feature() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        let mut raw = payload(20.0);
        raw.remove("worst_fractal_dimension");
        let err = svc.predict(&raw).unwrap_err();
        assert_eq!(err.code, OncoCode::MissingFeatures);
        assert!(err.to_string().contains("worst_fractal_dimension"));
    }

    #[test]
    fn lenient_policy_defaults_and_predicts() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Lenient);
        let mut raw = payload(20.0);
        raw.remove("mean_radius");
        let prediction = svc.predict(&raw).unwrap();
        assert_eq!(prediction.label, Label::Benign);
        assert_eq!(prediction.defaulted, vec!["mean_radius"]);
    }

    #[test]
    fn invalid_value_is_a_client_error() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        let mut raw = payload(20.0);
        raw.insert("mean_texture".into(), json!("abc"));
        let err = svc.predict(&raw).unwrap_err();
        assert_eq!(err.code, OncoCode::InvalidFeatureValue);
        assert!(err.code.is_client_error());
    }

    #[test]
    fn scaling_overflow_is_a_prediction_fault() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        let mut raw = payload(20.0);
        raw.insert("mean_radius".into(), json!(1e308));
        raw.insert("mean_area".into(), json!(-1e308));
        // Identity scaling keeps the values finite; the classifier copes too.
        assert!(svc.predict(&raw).is_ok());

        let schema = FeatureSchema::new(FeatureSet::Full);
        let mut scale = vec![1.0; N];
        scale[0] = 1e-300;
        let svc = PredictionService::new(
            schema,
            MissingPolicy::Strict,
            LoadedModel {
                classifier: linear_on_radius(),
                scaler: Scaler::Standard {
                    mean: vec![0.0; N],
                    scale,
                    feature_names: None,
                },
                classifier_digest: "test".into(),
                scaler_digest: "test".into(),
            },
        );
        let err = svc.predict(&raw).unwrap_err();
        assert_eq!(err.code, OncoCode::PredictionFailed);
    }

    #[test]
    fn payload_envelope_is_unwrapped() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        let body = json!({"features": payload(20.0)});
        assert_eq!(
            svc.predict_payload(Some(&body)).unwrap().label,
            Label::Malignant
        );

        for bad in [json!({}), json!({"features": [1, 2]}), json!("features"), json!({"features": {}})] {
            let err = svc.predict_payload(Some(&bad)).unwrap_err();
            assert_eq!(err.code, OncoCode::MissingInput, "{bad}");
        }
        assert_eq!(
            svc.predict_payload(None).unwrap_err().code,
            OncoCode::MissingInput
        );
    }

    #[test]
    fn exposes_canonical_order_and_health() {
        let svc = service_with(linear_on_radius(), MissingPolicy::Strict);
        assert_eq!(svc.feature_names().len(), 30);
        assert_eq!(svc.feature_names()[0], "mean_radius");
        assert!(svc.model_loaded());
        assert_eq!(svc.policy(), MissingPolicy::Strict);
    }
}
