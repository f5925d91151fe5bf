//! Startup loading of the classifier/scaler pair.

use tracing::{error, info};

use crate::common::error::OncoResult;
use crate::common::time;
use crate::features::FeatureSchema;

use super::domain::{ArtefactRepo, LoadedModel};

/// Load and validate both artefacts. Any failure here must abort startup.
pub fn load_model(repo: &dyn ArtefactRepo, schema: &FeatureSchema) -> OncoResult<LoadedModel> {
    let start = time::now_ms();
    let loaded = load_and_validate(repo, schema);
    let dur_ms = u64::try_from(time::since_ms(start)).unwrap_or(u64::MAX);

    match &loaded {
        Ok(model) => info!(
            module = "model",
            ev = "artefacts_loaded",
            code = 0u32,
            dur_ms,
            classifier = model.classifier.family(),
            model_kind = model.classifier.kind().as_str(),
            classifier_digest = %model.classifier_digest,
            scaler = model.scaler.name(),
            scaler_digest = %model.scaler_digest,
            feature_set = schema.set().as_str(),
            n_features = schema.len(),
        ),
        Err(err) => error!(
            module = "model",
            ev = "artefacts_load_failed",
            code = err.code as u32,
            dur_ms,
            error = %err,
        ),
    }
    loaded
}

fn load_and_validate(repo: &dyn ArtefactRepo, schema: &FeatureSchema) -> OncoResult<LoadedModel> {
    let classifier = repo.load_classifier()?;
    classifier.value.validate(schema)?;

    let scaler = repo.load_scaler()?;
    scaler.value.validate(schema)?;

    Ok(LoadedModel {
        classifier: classifier.value,
        scaler: scaler.value,
        classifier_digest: classifier.digest,
        scaler_digest: scaler.digest,
    })
}
