//! Logging initialization
//!
//! Structured logging via `tracing`. Log level is controlled with the
//! RUST_LOG environment variable (default: info).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Safe to call more than once; later calls are no-ops so tests and
/// embedding applications can both initialize without coordination.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
