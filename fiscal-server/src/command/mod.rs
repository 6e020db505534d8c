//! Single device commands (`POST /fiscalCommand`)

pub mod dispatcher;
pub mod request;

pub use dispatcher::{CommandDispatcher, CommandRejection, Planned};
pub use request::FiscalCommandRequest;
