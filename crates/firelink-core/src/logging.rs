#![forbid(unsafe_code)]

//! `tracing` subscriber bootstrap.
//!
//! The runtime emits events under `firelink::*` targets. Applications that
//! already install a subscriber need nothing from this module; [`init`] is
//! for binaries and demos that want a sensible default.
//!
//! The filter is read from `FIRELINK_LOG` (standard `EnvFilter` syntax) and
//! defaults to `warn`. With the `tracing-json` feature events are emitted as
//! JSON lines.

use tracing_subscriber::EnvFilter;

use crate::error::BindError;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FIRELINK_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build the filter from [`LOG_ENV`], falling back to `warn`.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`BindError::Config`] if a global subscriber is already set.
pub fn init() -> Result<(), BindError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);

    #[cfg(feature = "tracing-json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "tracing-json"))]
    let result = builder.try_init();

    result.map_err(|e| BindError::Config(e.to_string()))
}
