//! Service-level error taxonomy.
//!
//! Every public operation of the tile core reports failures through
//! [`ServiceError`]. Binary parse failures are deliberately absent: malformed
//! tiles degrade to empty results instead of erroring.

use thiserror::Error;

use crate::coord::CoordError;
use crate::provider::ProviderError;

/// Errors surfaced to callers of the tile core.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input such as an empty tile buffer.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Coordinates outside the tile grid, geographic range or provider zoom range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordError),

    /// No provider registered under the requested name.
    #[error("Unknown tile provider: {0}")]
    UnknownProvider(String),

    /// The upstream authoritatively has no such resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient upstream failure that persisted after all retries.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Rejected by admission control.
    #[error("Rate limit exceeded, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Milliseconds until the oldest request leaves the window.
        retry_after_ms: u64,
        /// Epoch milliseconds at which the window frees up.
        reset_time_ms: i64,
    },
}

impl ServiceError {
    /// Whether a caller retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::UpstreamUnavailable(_) | ServiceError::RateLimited { .. }
        )
    }
}

impl From<ProviderError> for ServiceError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotFound { url } => ServiceError::NotFound(url),
            ProviderError::UnsupportedZoom { zoom, min, max } => {
                ServiceError::InvalidCoordinate(CoordError::UnsupportedZoom { zoom, min, max })
            }
            other => ServiceError::UpstreamUnavailable(other.to_string()),
        }
    }
}
