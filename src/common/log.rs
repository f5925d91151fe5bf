//! Structured logging emitting one JSON object per line.
//!
//! Service events carry the same schema everywhere: `module`, `ev`, `code`
//! and `dur_ms`. Call sites needing extra context use `tracing` directly
//! with the same field names.

use tracing_subscriber::EnvFilter;

/// Install the global JSON subscriber. `RUST_LOG` wins over `default_level`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init();
}

/// Emit a service event matching the documented schema.
pub fn log_event(module: &str, event: &str, code: u32, dur_ms: u128) {
    let dur_ms = u64::try_from(dur_ms).unwrap_or(u64::MAX);
    if code == 0 {
        tracing::info!(module, ev = event, code, dur_ms);
    } else {
        tracing::warn!(module, ev = event, code, dur_ms);
    }
}
