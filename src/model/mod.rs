//! Model domain: trained classifier and scaler artefacts.
//!
//! Artefacts are exported by the training pipeline as tagged JSON documents
//! and loaded exactly once, before the server accepts connections.

pub mod classifier;
pub mod domain;
pub mod repo_fs;
pub mod scaler;
pub mod service;

pub use classifier::Classifier;
pub use domain::{ArtefactRepo, ImportanceSource, LoadedModel, ModelKind};
pub use repo_fs::FsArtefactRepo;
pub use scaler::Scaler;
pub use service::load_model;
