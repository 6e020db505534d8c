//! Whole-receipt processing (`POST /fullReceipt`)
//!
//! - [`request`] - wire DTOs and validation into a [`ReceiptDescription`]
//! - [`model`] - the validated receipt description
//! - [`engine`] - sequencing of device calls with abort-on-first-error

pub mod engine;
pub mod model;
pub mod request;

pub use engine::ReceiptEngine;
pub use model::{ReceiptDescription, ReceiptKind};
pub use request::{ReceiptRejection, ReceiptRequest};
