//! Core types - configuration, shared state, reply shape, server lifecycle
//!
//! - [`Config`] - layered configuration
//! - [`ServerState`] - handler state around the device session
//! - [`FiscalReply`] - `(code, message)` returned by every fiscal operation
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup and routing errors

pub mod config;
pub mod error;
pub mod reply;
pub mod server;
pub mod state;

pub use config::{Config, ConfigError, ConfigSource};
pub use error::{Result, ServerError};
pub use reply::FiscalReply;
pub use server::Server;
pub use state::ServerState;
