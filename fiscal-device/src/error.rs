//! Error types for the device library

use thiserror::Error;

/// Errors raised by an individual device operation
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// The driver rejected the call with its own error code
    #[error("Device error {code}: {message}")]
    Native { code: i32, message: String },

    /// The handle can no longer be used (released, disconnected)
    #[error("Device handle unavailable: {0}")]
    Unavailable(String),

    /// Anything else that went wrong inside the driver
    #[error("{0}")]
    Unexpected(String),
}

impl DeviceError {
    pub fn native(code: i32, message: impl Into<String>) -> Self {
        Self::Native {
            code,
            message: message.into(),
        }
    }
}

/// Construction of a fresh device handle failed
#[derive(Debug, Clone, Error)]
#[error("Failed to load device driver: {0}")]
pub struct DeviceInitError(pub String);

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;
