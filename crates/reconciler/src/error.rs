//! Error types for the reconciler crate.

use claimop_core::StoreError;
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
///
/// Store errors are transient: the host retries immediately on the returned
/// error. `RegionNotSupported` is a validation failure; it is retried on the
/// same path but recorded with a distinct, user-facing message so operators
/// can diagnose a stuck claim.
#[derive(Debug, Error, Clone)]
pub enum Error {
    #[error("region '{region}' is not supported")]
    RegionNotSupported { region: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Create a region-not-supported error.
    pub fn region_not_supported(region: impl Into<String>) -> Self {
        Self::RegionNotSupported {
            region: region.into(),
        }
    }

    /// Whether this is a validation failure rather than a transient one.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::RegionNotSupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_error_names_the_region() {
        let err = Error::region_not_supported("unsupported-region-1");
        assert!(err.to_string().contains("unsupported-region-1"));
        assert!(err.is_validation());
    }

    #[test]
    fn store_errors_are_not_validation() {
        let err = Error::from(StoreError::unavailable("connection refused"));
        assert!(!err.is_validation());
    }
}
