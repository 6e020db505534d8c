//! Device session - the only owner of the device handle
//!
//! - [`DeviceSession`] - timeout-bounded execution plus unload/reload recovery
//! - [`SessionGuard`] - exclusive use of the device for a sequence of calls
//! - [`CallFailure`] - why a call did not produce a device status

mod device_session;
mod failure;

pub use device_session::{DeviceSession, SessionGuard, SessionStatus};
pub use failure::{CallFailure, INIT_TIMEOUT_MESSAGE, NOT_LOADED_MESSAGE, TIMEOUT_MESSAGE};
