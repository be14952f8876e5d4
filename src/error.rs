//! Error types for datastore-export
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (database, fetch, export)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for datastore-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for datastore-export
///
/// Expected processing failures (fetch, decode, write) never surface through
/// this type; they are recorded on the request row as [`ExportError`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "process_interval")
        key: Option<String>,
    },

    /// Caller input was rejected before anything was persisted
    #[error("validation failed: {}", .messages.join("; "))]
    Validation {
        /// Every problem found in the input
        messages: Vec<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request not found
    #[error("request not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new requests
    #[error("shutdown in progress: not accepting new requests")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a single-message validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            messages: vec![message.into()],
        }
    }

    /// Shorthand for a configuration error tied to a key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found (or soft-deleted)
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Reasons the remote content fetcher could not supply a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote store does not know the identifier
    #[error("document {identifier} not found in the secure data store")]
    NotFound {
        /// The datastore identifier that was requested
        identifier: String,
    },

    /// The remote store answered but carried no content
    #[error("document {identifier} has no content")]
    EmptyContent {
        /// The datastore identifier that was requested
        identifier: String,
    },

    /// The identifier cannot be sent to the remote store
    #[error("invalid datastore identifier {identifier:?}")]
    InvalidIdentifier {
        /// The offending identifier
        identifier: String,
    },

    /// Non-success status other than 404
    #[error("secure data store returned HTTP {status} for {identifier}")]
    Status {
        /// The datastore identifier that was requested
        identifier: String,
        /// HTTP status code
        status: u16,
    },

    /// Connection, TLS or timeout failure
    #[error("transport failure fetching {identifier}: {reason}")]
    Transport {
        /// The datastore identifier that was requested
        identifier: String,
        /// Underlying transport error
        reason: String,
    },

    /// The response body was not the expected document shape
    #[error("malformed response for {identifier}: {reason}")]
    MalformedResponse {
        /// The datastore identifier that was requested
        identifier: String,
        /// Parser error
        reason: String,
    },
}

/// Terminal failure of a single export cycle
///
/// Each variant marks the request row failed; none of them is retried.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory could not be created
    #[error("output directory {path} is unavailable: {source}")]
    OutputDirectory {
        /// The resolved output directory
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The remote store did not supply content
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Content was not valid base64
    #[error("content for {identifier} is not valid base64: {source}")]
    Decode {
        /// The datastore identifier whose content failed to decode
        identifier: String,
        /// Decoder error
        source: base64::DecodeError,
    },

    /// The decoded content could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// The file that was being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl ExportError {
    /// Machine-readable failure code, reported with the cycle outcome
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::OutputDirectory { .. } => "output_directory_unavailable",
            ExportError::Fetch(FetchError::NotFound { .. }) => "document_not_found",
            ExportError::Fetch(FetchError::EmptyContent { .. }) => "empty_content",
            ExportError::Fetch(FetchError::InvalidIdentifier { .. }) => "invalid_identifier",
            ExportError::Fetch(FetchError::Status { .. }) => "datastore_status",
            ExportError::Fetch(FetchError::Transport { .. }) => "datastore_unreachable",
            ExportError::Fetch(FetchError::MalformedResponse { .. }) => "malformed_response",
            ExportError::Decode { .. } => "decode_failed",
            ExportError::Write { .. } => "write_failed",
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "validation_error",
///     "message": "validation failed: datastoreIdentifiers must contain at least one identifier",
///     "details": {
///       "errors": ["datastoreIdentifiers must contain at least one identifier"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation { .. } => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Database(DatabaseError::NotFound(_)) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::Database(DatabaseError::NotFound(_)) => "not_found",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation { messages } => Some(serde_json::json!({
                "errors": messages,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
