//! Uniform `(code, message)` result returned by every fiscal operation

use fiscal_device::status::{self, GENERIC_FAILURE};
use serde::{Deserialize, Serialize};

/// Message used when a successful operation produced no text
pub const SUCCESS_MESSAGE: &str = "Success";
/// Message used when a single command failed without a diagnostic
pub const COMMAND_FAILURE_MESSAGE: &str = "Error";
/// Message used when a receipt failed without a diagnostic
pub const RECEIPT_FAILURE_MESSAGE: &str = "Error during receipt processing.";

/// Wire shape: `{ "ErrorCode": 0, "ErrorMessage": "Success" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalReply {
    #[serde(rename = "ErrorCode")]
    pub code: i32,
    #[serde(rename = "ErrorMessage")]
    pub message: String,
}

impl FiscalReply {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Device status code with no message
    pub fn code(code: i32) -> Self {
        Self::new(code, String::new())
    }

    /// Local failure (`999`)
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(GENERIC_FAILURE, message)
    }

    pub fn is_success(&self) -> bool {
        status::is_success(self.code)
    }

    /// Fill an empty message with the success text or `failure_text`
    pub fn normalized(mut self, failure_text: &str) -> Self {
        if self.message.is_empty() {
            self.message = if self.is_success() {
                SUCCESS_MESSAGE.to_string()
            } else {
                failure_text.to_string()
            };
        }
        self
    }
}
