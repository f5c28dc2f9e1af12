//! Error types for the LiteDB client
//!
//! Provides a unified error type for all operations.
//!
//! Errors fall into three groups:
//! - **Admission** (`QueueFull`, `MessageTooLarge`): local and recoverable,
//!   nothing was written to the wire
//! - **Fatal** (`Protocol`, `Desync`, `Io`, `ConnectionClosed`,
//!   `ConnectionFailed`, `ConnectTimeout`): there is no usable connection,
//!   either because it was torn down or because it was never established
//! - **Server** (`Server`): the server answered with an `Err` frame

use thiserror::Error;

/// Result type alias using LiteDbError
pub type Result<T> = std::result::Result<T, LiteDbError>;

/// Unified error type for LiteDB client operations
#[derive(Debug, Error)]
pub enum LiteDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Admission Errors
    // -------------------------------------------------------------------------
    #[error("Queue is full: {max_length} commands outstanding")]
    QueueFull { max_length: usize },

    #[error("Command exceeds maximum message size: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Received data from server with no command waiting")]
    Desync,

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LiteDbError {
    /// Whether this error leaves no usable connection (torn down or never established)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LiteDbError::Io(_)
                | LiteDbError::Protocol(_)
                | LiteDbError::Desync
                | LiteDbError::ConnectionClosed
                | LiteDbError::ConnectionFailed(_)
                | LiteDbError::ConnectTimeout(_)
        )
    }
}
