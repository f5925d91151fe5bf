//! Error handling primitives shared across the service.
//!
//! Every failure carries a stable numeric code (used in log lines) and a
//! message that is safe to return to HTTP clients.

use std::borrow::Cow;

use thiserror::Error;

/// Stable error codes surfaced in structured logs.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OncoCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// No JSON body, no `features` object, or an empty payload.
    MissingInput = 1,
    /// One or more canonical features are absent.
    MissingFeatures = 2,
    /// A feature value could not be coerced to a number.
    InvalidFeatureValue = 3,
    /// Scaler or classifier failed on an otherwise valid request.
    PredictionFailed = 4,
    /// Configuration or artefact loading failed before serving.
    StartupFailure = 5,
}

impl OncoCode {
    /// Whether the code describes a problem with the caller's input.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            OncoCode::MissingInput | OncoCode::MissingFeatures | OncoCode::InvalidFeatureValue
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OncoCode::Ok => "ok",
            OncoCode::MissingInput => "missing_input",
            OncoCode::MissingFeatures => "missing_features",
            OncoCode::InvalidFeatureValue => "invalid_feature_value",
            OncoCode::PredictionFailed => "prediction_failed",
            OncoCode::StartupFailure => "startup_failure",
        }
    }
}

/// Canonical error type for the crate.
#[derive(Clone, Debug, Error)]
#[error("{msg}")]
pub struct OncoError {
    /// Machine parsable error code.
    pub code: OncoCode,
    /// Client facing message.
    pub msg: Cow<'static, str>,
}

/// Result alias used throughout the crate.
pub type OncoResult<T> = Result<T, OncoError>;

impl OncoError {
    /// Create a new error with the provided code and message.
    pub fn new(code: OncoCode, msg: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// Request carried nothing usable.
    pub fn missing_input(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(OncoCode::MissingInput, msg)
    }

    /// Lists every absent feature, in the order given.
    pub fn missing_features<S: AsRef<str>>(names: &[S]) -> Self {
        let joined = names
            .iter()
            .map(|n| n.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            OncoCode::MissingFeatures,
            format!("Missing required features: {joined}"),
        )
    }

    /// Value for `feature` is not numeric.
    pub fn invalid_value(feature: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            OncoCode::InvalidFeatureValue,
            format!("Invalid value for feature '{feature}': {detail}"),
        )
    }

    /// Internal fault during transform or prediction.
    pub fn prediction_failed(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(OncoCode::PredictionFailed, msg)
    }

    /// Configuration or artefact problem detected at startup.
    pub fn startup(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::new(OncoCode::StartupFailure, msg)
    }
}
