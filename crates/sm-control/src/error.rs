//! Error types for device control

use thiserror::Error;

/// Errors raised by a [`DeviceSession`](crate::DeviceSession)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation attempted before `connect`
    #[error("not connected to device")]
    NotConnected,

    /// WebSocket handshake failed
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// Request could not be encoded for sending
    #[error("failed to encode request for {path}: {reason}")]
    Encode { path: String, reason: String },

    /// Error on an established connection
    #[error("transport error: {0}")]
    Transport(String),

    /// Device closed the connection
    #[error("connection closed by device")]
    Closed,

    /// No response in time
    #[error("no response to {path} after {after_ms}ms")]
    Timeout { path: String, after_ms: u64 },

    /// Response could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Device answered with a non-success result code
    #[error("device rejected {path}: {code} {message}")]
    Rejected {
        path: String,
        code: i64,
        message: String,
    },
}

/// A device API version string that is not dotted numeric
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid API version '{input}': {reason}")]
pub struct VersionError {
    pub input: String,
    pub reason: String,
}

/// Errors that abort an apply run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Band set was empty, the device was not contacted
    #[error("no equalizer bands to apply")]
    NothingToApply,

    /// Device reported a version that cannot be compared
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    /// Session call failed
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A device address that is not a usable IP literal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid IP address '{input}': {reason}")]
pub struct AddressError {
    pub input: String,
    pub reason: String,
}
