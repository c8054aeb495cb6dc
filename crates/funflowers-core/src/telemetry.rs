//! Tracing subscriber setup for hosts that have none of their own.

use funflowers_types::{FlowersError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set. With `json` the
/// output is one JSON object per event.
///
/// # Errors
/// Returns `Configuration` for an unparsable directive and `Internal` if a
/// global subscriber is already installed.
pub fn init_tracing(default_directive: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|e| {
            FlowersError::Configuration(format!("invalid log directive {default_directive:?}: {e}"))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| FlowersError::Internal(format!("tracing init failed: {e}")))
}
