//! Shared utilities that glue the service layers together.
pub mod config;
pub mod error;
pub mod ids;
pub mod log;
pub mod time;

pub use error::{OncoCode, OncoError, OncoResult};
