//! Classification of a failed device call

use fiscal_device::status::GENERIC_FAILURE;
use thiserror::Error;

use crate::core::FiscalReply;

/// Message carried by a call that exceeded the configured timeout
pub const TIMEOUT_MESSAGE: &str = "Device call timed out.";

/// Recorded when building a handle exceeded the configured timeout
pub const INIT_TIMEOUT_MESSAGE: &str = "Device initialisation timed out.";

/// Message used when no handle exists and no init error was recorded
pub const NOT_LOADED_MESSAGE: &str = "Device is not loaded.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallFailure {
    /// No handle: auto-init suppressed, or construction failed
    #[error("{0}")]
    Uninitialized(String),

    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    /// The driver raised its own error code
    #[error("{message}")]
    Device { code: i32, message: String },

    #[error("{0}")]
    Unexpected(String),

    /// The worker thread panicked or exited without answering
    #[error("Device worker failed: {0}")]
    Worker(String),
}

impl CallFailure {
    /// Status code reported to the caller
    pub fn code(&self) -> i32 {
        match self {
            Self::Device { code, .. } => *code,
            _ => GENERIC_FAILURE,
        }
    }
}

impl From<CallFailure> for FiscalReply {
    fn from(failure: CallFailure) -> Self {
        FiscalReply::new(failure.code(), failure.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_code_passes_through() {
        let failure = CallFailure::Device {
            code: -2147352567,
            message: "paper out".into(),
        };
        let reply = FiscalReply::from(failure);
        assert_eq!(reply.code, -2147352567);
        assert_eq!(reply.message, "paper out");
    }

    #[test]
    fn test_local_failures_use_generic_code() {
        assert_eq!(CallFailure::Timeout.code(), 999);
        assert_eq!(CallFailure::Timeout.to_string(), TIMEOUT_MESSAGE);
        assert_eq!(CallFailure::Unexpected("boom".into()).code(), 999);
        assert_eq!(CallFailure::Worker("panic".into()).code(), 999);
    }
}
