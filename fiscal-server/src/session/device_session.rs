//! DeviceSession - timeout-bounded, self-recovering access to one device handle
//!
//! # Locking
//!
//! | Lock | Kind | Guards |
//! |------|------|--------|
//! | `gate` | tokio Mutex | every device call; held for a whole receipt via [`SessionGuard`] |
//! | `reload_lock` | tokio Mutex | handle construction / release (init, reload, load, unload) |
//! | `state` | parking_lot Mutex | handle slot and flags; never held across `.await` |
//!
//! Calls and constructions run on detached OS threads and are abandoned
//! after `com_timeout`. An abandoned call may still be running against the
//! released handle while the fresh handle serves the next request; it never
//! holds up runtime shutdown.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fiscal_device::{DeviceCommand, DeviceError, DeviceFactory, DeviceResult, FiscalDevice};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard, oneshot};
use tokio_util::sync::CancellationToken;

use super::failure::{CallFailure, INIT_TIMEOUT_MESSAGE, NOT_LOADED_MESSAGE};
use crate::core::FiscalReply;

struct SessionState {
    handle: Option<Arc<dyn FiscalDevice>>,
    /// Set by explicit unload, cleared by load/reload
    suppress_auto_init: bool,
    last_init_error: Option<String>,
    /// Bumped whenever the handle slot changes
    generation: u64,
    reload_count: u64,
}

/// Diagnostic snapshot, served by `GET /device/status`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub loaded: bool,
    pub auto_init_suppressed: bool,
    pub last_init_error: Option<String>,
    pub reload_count: u64,
    pub driver: String,
    pub com_timeout_ms: u64,
}

pub struct DeviceSession {
    factory: Arc<dyn DeviceFactory>,
    com_timeout: Duration,
    state: Mutex<SessionState>,
    gate: AsyncMutex<()>,
    reload_lock: AsyncMutex<()>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("driver", &self.factory.name())
            .field("com_timeout", &self.com_timeout)
            .finish_non_exhaustive()
    }
}

impl DeviceSession {
    /// Create a session with no handle; the first call (or [`Self::load`]) builds one
    pub fn new(factory: Arc<dyn DeviceFactory>, com_timeout: Duration) -> Self {
        Self {
            factory,
            com_timeout,
            state: Mutex::new(SessionState {
                handle: None,
                suppress_auto_init: false,
                last_init_error: None,
                generation: 0,
                reload_count: 0,
            }),
            gate: AsyncMutex::new(()),
            reload_lock: AsyncMutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a session and attempt the first initialisation eagerly
    ///
    /// A failed initialisation is recorded, not returned; later calls retry.
    pub async fn open(factory: Arc<dyn DeviceFactory>, com_timeout: Duration) -> Self {
        let session = Self::new(factory, com_timeout);
        {
            let _reload = session.reload_lock.lock().await;
            session.construct().await;
        }
        session
    }

    pub fn com_timeout(&self) -> Duration {
        self.com_timeout
    }

    /// Take exclusive use of the device until the guard is dropped
    pub async fn acquire(&self) -> SessionGuard<'_> {
        SessionGuard {
            session: self,
            _gate: self.gate.lock().await,
        }
    }

    /// Run a single status-returning command
    pub async fn execute(&self, command: DeviceCommand) -> FiscalReply {
        self.acquire().await.execute(command).await
    }

    /// Run a single `GetFiscalInfo` query
    pub async fn fiscal_info(&self, info_type: i32) -> FiscalReply {
        self.acquire().await.fiscal_info(info_type).await
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.lock();
        SessionStatus {
            loaded: state.handle.is_some(),
            auto_init_suppressed: state.suppress_auto_init,
            last_init_error: state.last_init_error.clone(),
            reload_count: state.reload_count,
            driver: self.factory.name().to_string(),
            com_timeout_ms: self.com_timeout.as_millis() as u64,
        }
    }

    /// Explicit load: re-enables auto-init and builds a fresh handle
    ///
    /// Waits for any receipt in progress. Returns whether a handle is held.
    pub async fn load(&self) -> bool {
        let _gate = self.gate.lock().await;
        let _reload = self.reload_lock.lock().await;
        tracing::info!(driver = self.factory.name(), "Explicit device load requested");

        let old = {
            let mut state = self.state.lock();
            state.suppress_auto_init = false;
            state.handle.take()
        };
        if let Some(old) = old {
            self.release_detached(old);
        }
        self.construct().await
    }

    /// Explicit unload: releases the handle and suppresses auto-init
    pub async fn unload(&self) {
        let _gate = self.gate.lock().await;
        let _reload = self.reload_lock.lock().await;
        tracing::info!(driver = self.factory.name(), "Explicit device unload requested");

        let old = {
            let mut state = self.state.lock();
            state.suppress_auto_init = true;
            state.generation += 1;
            state.handle.take()
        };
        if let Some(old) = old {
            self.release_detached(old);
        }
    }

    /// Cancel outstanding workers and release the handle
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let _reload = self.reload_lock.lock().await;
        let old = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.handle.take()
        };
        if let Some(old) = old {
            tracing::info!("Releasing device handle on shutdown");
            let release = detached("release", move || old.release());
            match tokio::time::timeout(self.com_timeout, release).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Device release failed on shutdown"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Device release worker failed on shutdown"),
                Err(_) => tracing::warn!("Device release timed out on shutdown; abandoning it"),
            }
        }
    }

    // ========== Internals ==========

    /// Build a fresh handle within `com_timeout`; caller holds `reload_lock`
    ///
    /// A construction that finishes after the timeout is dropped unused.
    async fn construct(&self) -> bool {
        let factory = self.factory.clone();
        let started = Instant::now();
        tracing::info!(driver = factory.name(), "Initialising device handle");

        let create = detached("init", move || factory.create());
        let outcome = match tokio::time::timeout(self.com_timeout, create).await {
            Ok(Ok(result)) => result.map_err(|e| e.to_string()),
            Ok(Err(worker)) => Err(format!("Device initialisation worker failed: {worker}")),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.com_timeout.as_millis() as u64,
                    "Device initialisation timed out"
                );
                Err(INIT_TIMEOUT_MESSAGE.to_string())
            }
        };

        let mut state = self.state.lock();
        state.generation += 1;
        state.suppress_auto_init = false;
        match outcome {
            Ok(handle) => {
                tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Device handle ready"
                );
                state.handle = Some(handle);
                state.last_init_error = None;
                true
            }
            Err(message) => {
                tracing::error!(error = %message, "Device initialisation failed");
                state.handle = None;
                state.last_init_error = Some(message);
                false
            }
        }
    }

    /// Current handle, initialising on demand unless suppressed
    async fn handle(&self) -> Result<(Arc<dyn FiscalDevice>, u64), CallFailure> {
        {
            let state = self.state.lock();
            if let Some(handle) = &state.handle {
                return Ok((handle.clone(), state.generation));
            }
            if state.suppress_auto_init {
                tracing::warn!("Device unloaded and auto-init suppressed; refusing call");
                return Err(uninitialized(&state));
            }
        }

        let _reload = self.reload_lock.lock().await;
        // Another path may have built the handle while we waited
        {
            let state = self.state.lock();
            if let Some(handle) = &state.handle {
                return Ok((handle.clone(), state.generation));
            }
        }
        tracing::info!("No device handle; attempting re-initialisation");
        self.construct().await;

        let state = self.state.lock();
        match &state.handle {
            Some(handle) => Ok((handle.clone(), state.generation)),
            None => Err(uninitialized(&state)),
        }
    }

    /// Swap in a fresh handle after a failure observed at `observed_generation`
    ///
    /// Concurrent triggers for the same generation collapse into one reload.
    async fn reload(&self, observed_generation: u64) {
        let _reload = self.reload_lock.lock().await;
        let old = {
            let mut state = self.state.lock();
            if state.generation != observed_generation {
                tracing::debug!("Handle already replaced; skipping reload");
                return;
            }
            state.reload_count += 1;
            state.handle.take()
        };
        tracing::info!("Reloading device handle (release, then initialise)");
        if let Some(old) = old {
            self.release_detached(old);
        }
        if !self.construct().await {
            tracing::warn!("Reload completed but the device is still not loaded");
        }
    }

    /// Best-effort release off the async runtime; failures are only logged
    fn release_detached(&self, handle: Arc<dyn FiscalDevice>) {
        // Not awaited: the outcome is logged from the worker itself
        drop(detached("release", move || {
            if let Err(e) = handle.release() {
                tracing::warn!(error = %e, "Exception while releasing device handle");
            }
        }));
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T, CallFailure>
    where
        T: Send + 'static,
        F: FnOnce(&dyn FiscalDevice) -> DeviceResult<T> + Send + 'static,
    {
        let (handle, generation) = self.handle().await?;
        let token = self.shutdown.child_token();
        let worker_token = token.clone();
        let started = Instant::now();

        let worker = detached(op, move || {
            if worker_token.is_cancelled() {
                return Err(DeviceError::Unavailable("call abandoned before start".into()));
            }
            let result = f(handle.as_ref());
            if worker_token.is_cancelled() {
                tracing::warn!(
                    op,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Abandoned device call completed late"
                );
            }
            result
        });

        let failure = match tokio::time::timeout(self.com_timeout, worker).await {
            Ok(Ok(Ok(value))) => {
                tracing::debug!(
                    op,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Device call completed"
                );
                return Ok(value);
            }
            Ok(Ok(Err(DeviceError::Native { code, message }))) => {
                tracing::error!(op, code, error = %message, "Device error; reloading handle");
                CallFailure::Device { code, message }
            }
            Ok(Ok(Err(other))) => {
                tracing::error!(op, error = %other, "Unexpected device failure; reloading handle");
                CallFailure::Unexpected(other.to_string())
            }
            Ok(Err(worker)) => {
                tracing::error!(op, error = %worker, "Device worker failed; reloading handle");
                CallFailure::Worker(worker)
            }
            Err(_elapsed) => {
                token.cancel();
                tracing::warn!(
                    op,
                    timeout_ms = self.com_timeout.as_millis() as u64,
                    "Device call timed out; reloading handle"
                );
                CallFailure::Timeout
            }
        };

        self.reload(generation).await;
        Err(failure)
    }
}

/// Run `f` on its own detached OS thread
///
/// The runtime never waits for the thread, so a hung driver call cannot
/// block shutdown. A panic is reported as `Err` with its message.
fn detached<T, F>(name: &'static str, f: F) -> impl Future<Output = Result<T, String>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name(format!("fiscal-{name}"))
        .spawn(move || {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(f));
            // The caller may have stopped waiting
            let _ = tx.send(outcome);
        });
    if let Err(e) = spawned {
        tracing::error!(worker = name, error = %e, "Failed to start device worker thread");
    }

    async move {
        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(panic)) => Err(panic_message(panic.as_ref())),
            Err(_) => Err("worker exited without a result".to_string()),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

fn uninitialized(state: &SessionState) -> CallFailure {
    CallFailure::Uninitialized(
        state
            .last_init_error
            .clone()
            .unwrap_or_else(|| NOT_LOADED_MESSAGE.to_string()),
    )
}

/// Exclusive use of the device for a sequence of calls
pub struct SessionGuard<'a> {
    session: &'a DeviceSession,
    _gate: AsyncMutexGuard<'a, ()>,
}

impl SessionGuard<'_> {
    /// Run one status-returning command
    pub async fn execute(&self, command: DeviceCommand) -> FiscalReply {
        let op = command.name();
        match self.session.call(op, move |device| command.apply(device)).await {
            Ok(code) => {
                tracing::debug!(op, code, "Device replied");
                FiscalReply::code(code)
            }
            Err(failure) => failure.into(),
        }
    }

    /// Query device information; the device text is returned verbatim
    pub async fn fiscal_info(&self, info_type: i32) -> FiscalReply {
        match self
            .session
            .call("GetFiscalInfo", move |device| device.get_fiscal_info(info_type))
            .await
        {
            Ok((code, text)) => {
                tracing::debug!(info_type, code, text = %text, "Fiscal info received");
                FiscalReply::new(code, text)
            }
            Err(failure) => failure.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiscal_device::SimulatedFactory;

    fn session() -> DeviceSession {
        DeviceSession::new(Arc::new(SimulatedFactory::new("0001")), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_first_call_initialises_lazily() {
        let session = session();
        assert!(!session.is_loaded());

        let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
        assert_eq!(reply, FiscalReply::code(0));
        assert!(session.is_loaded());
    }

    #[tokio::test]
    async fn test_unload_suppresses_auto_init_until_load() {
        let session = DeviceSession::open(
            Arc::new(SimulatedFactory::new("0001")),
            Duration::from_secs(5),
        )
        .await;
        assert!(session.is_loaded());

        session.unload().await;
        let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
        assert_eq!(reply.code, 999);
        assert_eq!(reply.message, NOT_LOADED_MESSAGE);
        assert!(!session.is_loaded());
        assert!(session.status().auto_init_suppressed);

        assert!(session.load().await);
        assert!(!session.status().auto_init_suppressed);
        assert_eq!(session.execute(DeviceCommand::OpenCashDrawer).await.code, 0);
    }

    #[tokio::test]
    async fn test_fiscal_info_returns_device_text() {
        let session = session();
        let reply = session.fiscal_info(fiscal_device::status::INFO_CASH_REGISTER_NO).await;
        assert_eq!(reply, FiscalReply::new(0, "0001"));
    }

    #[tokio::test]
    async fn test_guard_keeps_calls_in_program_order() {
        let factory = Arc::new(SimulatedFactory::new("0001"));
        let session = DeviceSession::new(factory.clone(), Duration::from_secs(5));
        {
            let guard = session.acquire().await;
            assert_eq!(guard.execute(DeviceCommand::BeginFiscalReceipt).await.code, 0);
            assert_eq!(guard.execute(DeviceCommand::EndFiscalCacheReceipt).await.code, 0);
        }
        assert_eq!(
            factory.journal(),
            vec!["BeginFiscalReceipt".to_string(), "EndFiscalCacheReceipt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_shutdown_releases_handle() {
        let session = session();
        session.execute(DeviceCommand::OpenCashDrawer).await;
        session.shutdown().await;
        assert!(!session.is_loaded());
    }
}
