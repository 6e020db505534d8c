//! Utilities
//!
//! - [`logger`] - tracing setup and log rotation cleanup

pub mod logger;
