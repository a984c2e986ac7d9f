//! Error types for firebird-pushdown

use thiserror::Error;

/// The result type for pushdown operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or building remote statements.
///
/// Walker rejections are not errors: a fragment that cannot be pushed down is
/// reported as a [`Rejection`](crate::walker::Rejection) and simply evaluated
/// locally.
#[derive(Debug, Error)]
pub enum Error {
    /// Contract violation between components (generator handed a node the
    /// walker rejects, missing row-identity carrier, catalog drift).
    #[error("Internal error: {0}")]
    Internal(String),

    /// The remote engine rejected or failed to execute a generated statement
    #[error("Remote execution error: {message}")]
    RemoteExecution { message: String, statement: String },

    /// Invalid foreign server/table/column option
    #[error("Invalid option: {message}")]
    InvalidOption {
        message: String,
        hint: Option<String>,
    },

    /// Modification requested on a relation that does not allow it
    #[error("foreign table \"{relation}\" does not allow {operation}")]
    ReadOnly { relation: String, operation: String },

    /// Remote version string could not be parsed
    #[error("Invalid remote version: {0}")]
    InvalidVersion(String),
}

impl Error {
    /// Create an internal consistency error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// Create a remote execution error, keeping the statement for diagnostics
    pub fn remote(message: impl Into<String>, statement: impl Into<String>) -> Self {
        Error::RemoteExecution {
            message: message.into(),
            statement: statement.into(),
        }
    }

    /// Create an option validation error
    pub fn invalid_option(message: impl Into<String>) -> Self {
        Error::InvalidOption {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an option validation error with a hint
    pub fn invalid_option_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Error::InvalidOption {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a read-only relation error
    pub fn read_only(relation: impl Into<String>, operation: impl Into<String>) -> Self {
        Error::ReadOnly {
            relation: relation.into(),
            operation: operation.into(),
        }
    }

    /// Create a version parsing error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Error::InvalidVersion(version.into())
    }

    /// Whether this error signals a bug between components rather than a data
    /// or configuration problem.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}
