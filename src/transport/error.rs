//! Transport Error Types
//!
//! Error types for transport-level operations, separate from JSON-RPC protocol errors.

/// Transport-level error types
///
/// These errors represent transport layer failures, separate from
/// JSON-RPC protocol errors that are part of the message format.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed or was lost
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Message serialization/deserialization failed
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// I/O error during transport operations
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Transport was closed
    #[error("Transport is closed")]
    Closed,

    /// Transport-specific error
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Timeout during operation
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
}

impl TransportError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a transport-specific error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }
}
