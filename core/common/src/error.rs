//! Common error types for vaultkv.

use std::fmt;

use thiserror::Error;

/// Sentinel cause carried by [`Error::PathNotFound`] when a path holds no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSecretData;

impl fmt::Display for NoSecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no secret data")
    }
}

impl std::error::Error for NoSecretData {}

/// Top-level error type for vaultkv operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied an empty secret path.
    #[error("secret path is empty")]
    EmptyPath,

    /// A version operation was called without any version numbers.
    #[error("must specify at least one version")]
    MissingVersions,

    /// Nothing is stored at the path.
    #[error("{op} {path}: {source}")]
    PathNotFound {
        op: &'static str,
        path: String,
        #[source]
        source: NoSecretData,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error: status {status}: {}", errors.join(", "))]
    Api { status: u16, errors: Vec<String> },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be encoded or did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Build the path-scoped not-found error for `op` on `path`.
    pub fn not_found(op: &'static str, path: impl Into<String>) -> Self {
        Self::PathNotFound {
            op,
            path: path.into(),
            source: NoSecretData,
        }
    }

    /// Whether this error was caused by an empty path on the backend.
    pub fn is_no_secret_data(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }

    /// HTTP status of a backend rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_not_found_exposes_sentinel() {
        let err = Error::not_found("read_secret", "/cubbyhole/foo");
        assert!(err.is_no_secret_data());
        assert_eq!(err.to_string(), "read_secret /cubbyhole/foo: no secret data");

        let source = err.source().unwrap();
        assert!(source.downcast_ref::<NoSecretData>().is_some());
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: 400,
            errors: vec!["check-and-set parameter did not match".to_string()],
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "API error: status 400: check-and-set parameter did not match"
        );
    }
}
