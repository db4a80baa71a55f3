//! Error types for permission reconciliation.
//!
//! Errors are categorized so callers can tell apart configuration mistakes
//! (caught before any request is sent), objects that no longer exist, and
//! failures reported by the remote API.

use std::fmt;

/// Result type alias for permission operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes the API uses for objects that do not exist.
const NOT_FOUND_CODES: &[&str] = &["RESOURCE_DOES_NOT_EXIST", "NOT_FOUND"];

/// Categories of permission errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Declared configuration is invalid; nothing was sent.
    Validation,
    /// The target object does not exist.
    NotFound,
    /// The API rejected the request.
    Remote,
    /// A path or creator lookup failed.
    Resolution,
    /// An object type or object path is not known to the registry.
    Classification,
    /// Connection, timeout or malformed response.
    Transport,
    /// The operation was cancelled before completion.
    Cancelled,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid configuration",
            Self::NotFound => "Object not found",
            Self::Remote => "Request rejected by the API",
            Self::Resolution => "Could not resolve object",
            Self::Classification => "Unknown object type",
            Self::Transport => "Connection issue",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => "Fix the declared permissions and try again",
            Self::NotFound => "The object was removed; drop its permissions block",
            Self::Remote => "Check the error code and message returned by the workspace",
            Self::Resolution => "Verify the path or ID exists in the workspace",
            Self::Classification => "This object type is not supported",
            Self::Transport => "Check the workspace host and your network connection",
            Self::Cancelled => "Re-run the command to finish the remaining objects",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A single problem found while validating declared configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Configuration field the problem belongs to.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Errors that can occur while reconciling permissions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Declared configuration failed validation.
    #[error("invalid config supplied. {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// No identifier field was declared.
    #[error("at least one type of resource identifier must be set")]
    MissingIdentifier,

    /// The API answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the response body.
        error_code: String,
        /// Human-readable message from the response body.
        message: String,
    },

    /// A path or creator lookup failed.
    #[error("cannot load {target}: {source}")]
    Resolution {
        /// What was being resolved (e.g. `path /Shared/nb`).
        target: String,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The server reported an object type the registry does not know.
    #[error("unknown object type {0}")]
    UnknownObjectType(String),

    /// An object path does not belong to any known object type.
    #[error("unsupported object id: {0}")]
    UnsupportedObjectId(String),

    /// Connection-level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The cancellation signal fired before the next call.
    #[error("operation cancelled")]
    Cancelled,
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(". ")
}

impl Error {
    /// Create a validation error for a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Create an API error.
    pub fn api(status: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    /// Wrap a lookup failure with the name of what was being resolved.
    pub fn resolution(target: impl Into<String>, source: Error) -> Self {
        Self::Resolution {
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) | Error::MissingIdentifier => ErrorCategory::Validation,
            Error::Api { .. } if self.is_not_found() => ErrorCategory::NotFound,
            Error::Api { .. } => ErrorCategory::Remote,
            Error::Resolution { .. } => ErrorCategory::Resolution,
            Error::UnknownObjectType(_) | Error::UnsupportedObjectId(_) => {
                ErrorCategory::Classification
            }
            Error::Transport { .. } | Error::InvalidResponse(_) => ErrorCategory::Transport,
            Error::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether the API reported that the object does not exist.
    ///
    /// Only direct API errors count; a failed lookup wrapped in
    /// [`Error::Resolution`] is not a missing target.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Api {
                status, error_code, ..
            } => *status == 404 || NOT_FOUND_CODES.contains(&error_code.as_str()),
            _ => false,
        }
    }

    /// The server's error code, looking through resolution wrappers.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Error::Api { error_code, .. } => Some(error_code),
            Error::Resolution { source, .. } => source.error_code(),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
