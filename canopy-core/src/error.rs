//! Error types for Canopy.
//!
//! Structured errors with unique codes and client/server categorization.
//! Proof verification never travels through this module: verifiers return
//! a plain `bool` and reserve `Error` for construction and I/O failures.

use std::io;
use thiserror::Error;

/// Result type for Canopy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes.
///
/// - 1xxx: validation errors (client)
/// - 2xxx: not found errors (client)
/// - 5xxx: storage errors (server)
/// - 6xxx: internal errors (server)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidHash = 1001,
    InvalidProof = 1002,
    InvalidInput = 1003,

    // Not found errors (2xxx)
    TreeNotFound = 2001,

    // Storage errors (5xxx)
    StorageRead = 5001,
    StorageWrite = 5002,
    StorageCorruption = 5003,

    // Internal errors (6xxx)
    Serialization = 6001,
    Internal = 6002,
}

impl ErrorCode {
    /// Get the numeric code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this is a client error.
    pub fn is_client_error(self) -> bool {
        (1000..5000).contains(&self.code())
    }

    /// Check if this is a server error.
    pub fn is_server_error(self) -> bool {
        self.code() >= 5000
    }

    /// Check if this error is retryable.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCode::StorageRead | ErrorCode::StorageWrite)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Errors that can occur in Canopy.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid hash format or value.
    #[error("[{code}] invalid hash: {message}")]
    InvalidHash {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Proof construction failed (verification failures return `false`).
    #[error("[{code}] invalid proof: {message}")]
    InvalidProof { code: ErrorCode, message: String },

    /// Invalid input parameters.
    #[error("[{code}] invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    /// Item not found.
    #[error("[{code}] not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// Storage operation failed.
    #[error("[{code}] storage error: {message}")]
    Storage {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persisted data failed an integrity check.
    #[error("[{code}] corruption: {message}")]
    Corruption { code: ErrorCode, message: String },

    /// Serialization/deserialization failed.
    #[error("[{code}] serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal error (a broken invariant).
    #[error("[{code}] internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl Error {
    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidHash { code, .. } => *code,
            Error::InvalidProof { code, .. } => *code,
            Error::InvalidInput { code, .. } => *code,
            Error::NotFound { code, .. } => *code,
            Error::Storage { code, .. } => *code,
            Error::Corruption { code, .. } => *code,
            Error::Serialization { code, .. } => *code,
            Error::Internal { code, .. } => *code,
        }
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.code().is_client_error()
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.code().is_server_error()
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(message: impl Into<String>) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: message.into(),
            source: None,
        }
    }

    /// Create an InvalidProof error.
    pub fn invalid_proof(message: impl Into<String>) -> Self {
        Error::InvalidProof {
            code: ErrorCode::InvalidProof,
            message: message.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            code: ErrorCode::TreeNotFound,
            message: message.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Error::Corruption {
            code: ErrorCode::StorageCorruption,
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Storage {
            code: ErrorCode::StorageRead,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHash {
            code: ErrorCode::InvalidHash,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            code: ErrorCode::Serialization,
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
