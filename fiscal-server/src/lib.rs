//! Fiscal Server - HTTP front end for a single fiscal cash register
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)
//!   ├── /fiscalCommand ──> CommandDispatcher ─┐
//!   └── /fullReceipt   ──> ReceiptEngine ─────┤
//!                                             v
//!                                       DeviceSession ──> FiscalDevice (handle)
//! ```
//!
//! - **session**: owns the device handle; timeout-bounded calls, reload on failure,
//!   explicit load / unload
//! - **receipt**: whole receipts sequenced under one exclusive session guard
//! - **command**: one device call per request
//! - **api**: routes and middleware
//! - **core**: configuration, state, reply shape, server lifecycle
//!
//! Every fiscal operation answers `{ "ErrorCode", "ErrorMessage" }`; device
//! codes pass through, local failures use `999`.

pub mod api;
pub mod command;
pub mod core;
pub mod receipt;
pub mod session;
pub mod utils;

pub use command::{CommandDispatcher, FiscalCommandRequest};
pub use core::{Config, FiscalReply, Server, ServerError, ServerState};
pub use receipt::{ReceiptEngine, ReceiptRequest};
pub use session::DeviceSession;

pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Load `.env` (if any) before configuration is read
pub fn setup_environment() {
    match dotenv::dotenv() {
        Ok(path) => eprintln!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("Failed to load .env: {e}"),
    }
}

pub fn print_banner() {
    println!(
        r#"
    _______                 __
   / ____(_)_____________ _/ /
  / /_  / / ___/ ___/ __ `/ /
 / __/ / (__  ) /__/ /_/ / /
/_/   /_/____/\___/\__,_/_/
        fiscal-server v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
