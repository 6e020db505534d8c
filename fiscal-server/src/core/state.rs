use std::sync::Arc;

use fiscal_device::DeviceFactory;

use crate::command::CommandDispatcher;
use crate::core::Config;
use crate::receipt::ReceiptEngine;
use crate::session::DeviceSession;

/// Shared handler state
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Loaded configuration (immutable) |
/// | session | The single device session |
/// | engine | Whole-receipt processing over `session` |
/// | dispatcher | Single-command dispatch over `session` |
///
/// Cloning is cheap; every field shares the same session.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub session: Arc<DeviceSession>,
    pub engine: ReceiptEngine,
    pub dispatcher: CommandDispatcher,
}

impl ServerState {
    /// Wire the engine and dispatcher to an existing session
    pub fn new(config: Config, session: Arc<DeviceSession>) -> Self {
        Self {
            engine: ReceiptEngine::new(session.clone()),
            dispatcher: CommandDispatcher::new(session.clone()),
            config,
            session,
        }
    }

    /// Open the device session eagerly and build the state around it
    ///
    /// A failed first initialisation is logged and retried on the first call.
    pub async fn initialize(config: Config, factory: Arc<dyn DeviceFactory>) -> Self {
        let session = DeviceSession::open(factory, config.com_timeout()).await;
        if !session.is_loaded() {
            tracing::warn!("Device not available at startup; will retry on first request");
        }
        Self::new(config, Arc::new(session))
    }
}
