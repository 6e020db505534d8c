//! # fiscal-device
//!
//! Fiscal printer / cash register capability - the device side only.
//!
//! ## Scope
//!
//! This crate describes WHAT a device can do:
//! - [`FiscalDevice`] trait: one typed, blocking method per driver operation
//! - [`DeviceFactory`] trait: construction of fresh handles
//! - [`DeviceCommand`]: owned, sendable form of a status-returning call
//! - Status-code constants shared with the service layer
//! - [`SimulatedDevice`]: in-memory virtual register
//!
//! Timeouts, recovery and receipt sequencing belong to the application
//! (`fiscal-server`), which owns the handle exclusively.
//!
//! ## Example
//!
//! ```ignore
//! use fiscal_device::{DeviceCommand, DeviceFactory, SimulatedFactory};
//!
//! let factory = SimulatedFactory::new("0001");
//! let device = factory.create()?;
//! let code = DeviceCommand::OpenCashDrawer.apply(device.as_ref())?;
//! assert_eq!(code, fiscal_device::status::SUCCESS);
//! ```

mod command;
mod device;
mod error;
mod simulated;
pub mod status;

// Re-exports
pub use command::DeviceCommand;
pub use device::{DeviceFactory, FiscalDevice, Payment, PaymentEx};
pub use error::{DeviceError, DeviceInitError, DeviceResult};
pub use simulated::{
    ERR_NO_RECEIPT, ERR_RECEIPT_OPEN, JOURNAL_CAPACITY, SimulatedDevice, SimulatedFactory,
};
