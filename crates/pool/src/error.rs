//! Error types for pool operations
use thiserror::Error;

/// Boxed error returned by factory hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`Pool`](crate::Pool) operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The pool stopped admitting new demand (`drain` or `destroy_all_now`).
    #[error("Pool '{pool}' is draining and cannot accept work")]
    Draining {
        /// The pool name
        pool: String,
    },

    /// The factory's create hook reported a failure.
    #[error("Resource creation failed in pool '{pool}': {source}")]
    CreateFailed {
        /// The pool name
        pool: String,
        /// The error reported by the factory
        #[source]
        source: BoxError,
    },

    /// A resource was handed back that the pool does not consider checked out.
    #[error("Invalid release in pool '{pool}': {reason}")]
    InvalidRelease {
        /// The pool name
        pool: String,
        /// What was wrong with the release
        reason: String,
    },

    /// A queued acquire request was torn down by `destroy_all_now`.
    #[error("Pool '{pool}' was destroyed while the request was waiting")]
    Abandoned {
        /// The pool name
        pool: String,
    },

    /// Pool configuration is invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a draining error for the named pool
    pub fn draining<S: Into<String>>(pool: S) -> Self {
        Self::Draining { pool: pool.into() }
    }

    /// Wrap a factory failure
    pub fn create_failed<S: Into<String>>(pool: S, source: BoxError) -> Self {
        Self::CreateFailed {
            pool: pool.into(),
            source,
        }
    }

    /// Create an invalid-release error
    pub fn invalid_release<S: Into<String>, R: Into<String>>(pool: S, reason: R) -> Self {
        Self::InvalidRelease {
            pool: pool.into(),
            reason: reason.into(),
        }
    }

    /// Create an abandoned-request error
    pub fn abandoned<S: Into<String>>(pool: S) -> Self {
        Self::Abandoned { pool: pool.into() }
    }

    /// Check if the caller may reasonably retry the operation.
    ///
    /// The pool itself never retries; this only classifies the failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CreateFailed { .. })
    }

    /// Get the pool name associated with this error (if any)
    #[must_use]
    pub fn pool(&self) -> Option<&str> {
        match self {
            Self::Configuration { .. } => None,
            Self::Draining { pool }
            | Self::CreateFailed { pool, .. }
            | Self::InvalidRelease { pool, .. }
            | Self::Abandoned { pool } => Some(pool),
        }
    }
}
