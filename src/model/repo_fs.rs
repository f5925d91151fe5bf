//! Filesystem repository for exported model artefacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::common::config::AppCfg;
use crate::common::error::{OncoError, OncoResult};
use crate::common::ids::ArtefactDigest;

use super::classifier::Classifier;
use super::domain::{Artefact, ArtefactRepo};
use super::scaler::Scaler;

/// Reads JSON artefacts from the configured model directory.
pub struct FsArtefactRepo {
    classifier_path: PathBuf,
    scaler_path: PathBuf,
}

impl FsArtefactRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            classifier_path: cfg.classifier_path(),
            scaler_path: cfg.scaler_path(),
        }
    }

    pub fn with_paths(classifier_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            classifier_path: classifier_path.into(),
            scaler_path: scaler_path.into(),
        }
    }
}

impl ArtefactRepo for FsArtefactRepo {
    fn load_classifier(&self) -> OncoResult<Artefact<Classifier>> {
        read_json("classifier", &self.classifier_path)
    }

    fn load_scaler(&self) -> OncoResult<Artefact<Scaler>> {
        read_json("scaler", &self.scaler_path)
    }
}

fn read_json<T: DeserializeOwned>(what: &str, path: &Path) -> OncoResult<Artefact<T>> {
    let bytes = fs::read(path).map_err(|e| {
        OncoError::startup(format!("failed to read {what} artefact {}: {e}", path.display()))
    })?;
    let value = serde_json::from_slice(&bytes).map_err(|e| {
        OncoError::startup(format!("failed to parse {what} artefact {}: {e}", path.display()))
    })?;

    Ok(Artefact {
        value,
        path: path.display().to_string(),
        digest: ArtefactDigest::of(&bytes).finish_hex(),
    })
}
