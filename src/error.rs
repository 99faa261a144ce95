//! Error types for quire.

use std::io;
use thiserror::Error;

/// Result type alias for quire operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while composing or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// A scope was closed without a matching open, or out of order.
    #[error("Scope mismatch: expected to close {expected}, found {found}")]
    ScopeMismatch {
        /// The scope the caller tried to close
        expected: String,
        /// The scope that is actually innermost
        found: String,
    },

    /// A write was attempted on a node that has already been finalized.
    #[error("Cannot modify closed {node}")]
    ClosedNodeMutation {
        /// Kind of node that was closed
        node: &'static str,
    },

    /// A citation key could not be resolved by the references collaborator.
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    /// A backend cannot express a style carried by a node.
    #[error("Backend {backend} cannot render {style} at {path}")]
    UnsupportedStyle {
        /// Backend name
        backend: &'static str,
        /// Offending style flag
        style: String,
        /// Path of the offending node
        path: String,
    },

    /// Configuration rejected at document creation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No backend is registered under the requested name or extension.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::ClosedNodeMutation`].
    pub fn closed(node: &'static str) -> Self {
        Error::ClosedNodeMutation { node }
    }

    /// Shorthand for [`Error::ScopeMismatch`].
    pub fn scope_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::ScopeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether the error signals caller misuse of the construction API.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Error::ScopeMismatch { .. } | Error::ClosedNodeMutation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::closed("list");
        assert_eq!(err.to_string(), "Cannot modify closed list");

        let err = Error::scope_mismatch("bold", "italic");
        assert_eq!(
            err.to_string(),
            "Scope mismatch: expected to close bold, found italic"
        );

        let err = Error::ReferenceNotFound("Darwin 1859".into());
        assert_eq!(err.to_string(), "Reference not found: Darwin 1859");
    }

    #[test]
    fn test_programming_errors() {
        assert!(Error::closed("paragraph").is_programming_error());
        assert!(!Error::ReferenceNotFound("x".into()).is_programming_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
