//! Runtime configuration loaded from the process environment.
//!
//! The snapshot is read once at startup and never changes afterwards.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::common::error::{OncoError, OncoResult};
use crate::features::domain::{FeatureSet, MissingPolicy};

/// HTTP status returned when the scaler or classifier faults mid-request.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FaultStatus {
    #[default]
    InternalServerError,
    BadRequest,
}

impl FaultStatus {
    pub fn as_u16(self) -> u16 {
        match self {
            FaultStatus::InternalServerError => 500,
            FaultStatus::BadRequest => 400,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "500" => Some(FaultStatus::InternalServerError),
            "400" => Some(FaultStatus::BadRequest),
            _ => None,
        }
    }
}

/// Snapshot of configuration values consumed by the service.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub host: IpAddr,
    pub port: u16,
    pub model_dir: PathBuf,
    pub classifier_file: String,
    pub scaler_file: String,
    pub feature_set: FeatureSet,
    pub missing_policy: MissingPolicy,
    pub fault_status: FaultStatus,
    pub log_level: String,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            model_dir: PathBuf::from("models"),
            classifier_file: "best_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            feature_set: FeatureSet::Full,
            missing_policy: MissingPolicy::Strict,
            fault_status: FaultStatus::InternalServerError,
            log_level: "info".to_string(),
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> OncoResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup. Absent keys keep their
    /// defaults; present but unparseable values are rejected.
    pub fn from_lookup<F>(lookup: F) -> OncoResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("PORT") {
            cfg.port = raw
                .trim()
                .parse()
                .map_err(|_| invalid("PORT", &raw))?;
        }
        if let Some(raw) = lookup("ONCO1_HOST") {
            cfg.host = raw
                .trim()
                .parse()
                .map_err(|_| invalid("ONCO1_HOST", &raw))?;
        }
        if let Some(raw) = lookup("ONCO1_MODEL_DIR") {
            cfg.model_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ONCO1_CLASSIFIER_FILE") {
            cfg.classifier_file = raw;
        }
        if let Some(raw) = lookup("ONCO1_SCALER_FILE") {
            cfg.scaler_file = raw;
        }
        if let Some(raw) = lookup("ONCO1_FEATURE_SET") {
            cfg.feature_set =
                FeatureSet::parse(&raw).ok_or_else(|| invalid("ONCO1_FEATURE_SET", &raw))?;
        }
        if let Some(raw) = lookup("ONCO1_MISSING_POLICY") {
            cfg.missing_policy = MissingPolicy::parse(&raw)
                .ok_or_else(|| invalid("ONCO1_MISSING_POLICY", &raw))?;
        }
        if let Some(raw) = lookup("ONCO1_FAULT_STATUS") {
            cfg.fault_status =
                FaultStatus::parse(&raw).ok_or_else(|| invalid("ONCO1_FAULT_STATUS", &raw))?;
        }
        if let Some(raw) = lookup("ONCO1_LOG_LEVEL") {
            cfg.log_level = raw;
        }

        Ok(cfg)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.model_dir.join(&self.classifier_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(&self.scaler_file)
    }
}

fn invalid(key: &str, raw: &str) -> OncoError {
    OncoError::startup(format!("invalid value for {key}: '{raw}'"))
}
