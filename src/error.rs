//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is not cached and no loader is configured to produce it
    #[error("key not found in cache")]
    KeyNotFound,

    /// The loader returned an error; its message and source chain are passed through
    #[error(transparent)]
    Loader(anyhow::Error),

    /// A configuration value could not be understood
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Returns true if this error originated in the loader.
    pub fn is_loader_failure(&self) -> bool {
        matches!(self, CacheError::Loader(_))
    }

    /// Unwraps the loader's original error, if this is a loader failure.
    pub fn into_loader_error(self) -> Option<anyhow::Error> {
        match self {
            CacheError::Loader(err) => Some(err),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
