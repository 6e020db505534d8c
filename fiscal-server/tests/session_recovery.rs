//! Timeout, reload and load/unload behaviour of the device session

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Outcome, ScriptedFactory, open_session};
use fiscal_device::DeviceCommand;
use fiscal_server::DeviceSession;
use fiscal_server::session::{INIT_TIMEOUT_MESSAGE, NOT_LOADED_MESSAGE, TIMEOUT_MESSAGE};

const SHORT: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_timeout_returns_promptly_and_reloads_once() {
    let factory = ScriptedFactory::new();
    factory.script("OpenCashDrawer", Outcome::Hang(Duration::from_secs(2)));
    let session = open_session(&factory, SHORT).await;
    assert_eq!(factory.created(), 1);

    let started = Instant::now();
    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(reply.code, 999);
    assert_eq!(reply.message, TIMEOUT_MESSAGE);
    assert_eq!(factory.created(), 2);
    assert_eq!(session.status().reload_count, 1);

    // The fresh handle serves the next call
    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    assert_eq!(reply.code, 0);
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn test_fiscal_info_timeout_uses_diagnostic_and_reloads() {
    let factory = ScriptedFactory::new();
    factory.script("GetFiscalInfo", Outcome::Hang(Duration::from_secs(2)));
    let session = open_session(&factory, SHORT).await;

    let reply = session.fiscal_info(3).await;
    assert_eq!(reply.code, 999);
    assert_eq!(reply.message, TIMEOUT_MESSAGE);
    assert_eq!(factory.created(), 2);

    let reply = session.fiscal_info(3).await;
    assert_eq!((reply.code, reply.message.as_str()), (0, "ECR-0042"));
}

#[tokio::test]
async fn test_driver_error_code_passes_through_and_reloads() {
    let factory = ScriptedFactory::new();
    factory.script("PrintXReport", Outcome::Raise(-2147352567, "paper out"));
    let session = open_session(&factory, SHORT).await;

    let reply = session.execute(DeviceCommand::PrintXReport).await;
    assert_eq!(reply.code, -2147352567);
    assert_eq!(reply.message, "paper out");
    assert_eq!(factory.created(), 2);
    assert_eq!(session.status().reload_count, 1);
}

#[tokio::test]
async fn test_unexpected_driver_failure_reloads() {
    let factory = ScriptedFactory::new();
    factory.script("PrintXReport", Outcome::Fail("COM object disconnected"));
    let session = open_session(&factory, SHORT).await;

    let reply = session.execute(DeviceCommand::PrintXReport).await;
    assert_eq!(reply.code, 999);
    assert_eq!(reply.message, "COM object disconnected");
    assert_eq!(factory.created(), 2);
    assert_eq!(session.status().reload_count, 1);
}

#[tokio::test]
async fn test_panicking_driver_call_reloads() {
    let factory = ScriptedFactory::new();
    factory.script("OpenCashDrawer", Outcome::Panic("driver crashed"));
    let session = open_session(&factory, SHORT).await;

    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    assert_eq!(reply.code, 999);
    assert_eq!(reply.message, "Device worker failed: panicked: driver crashed");
    assert_eq!(factory.created(), 2);
    assert_eq!(session.status().reload_count, 1);

    assert_eq!(session.execute(DeviceCommand::OpenCashDrawer).await.code, 0);
}

#[tokio::test]
async fn test_slow_construction_after_timeout_stays_bounded() {
    let factory = ScriptedFactory::new();
    let session = open_session(&factory, SHORT).await;
    factory.script("OpenCashDrawer", Outcome::Hang(Duration::from_secs(3)));
    factory.set_create_delay(Duration::from_secs(2));

    let started = Instant::now();
    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    // Call timeout plus construction timeout, never the full construction
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!((reply.code, reply.message.as_str()), (999, TIMEOUT_MESSAGE));

    let status = session.status();
    assert!(!status.loaded);
    assert_eq!(status.last_init_error.as_deref(), Some(INIT_TIMEOUT_MESSAGE));

    // The next call retries construction
    factory.set_create_delay(Duration::ZERO);
    assert_eq!(session.execute(DeviceCommand::OpenCashDrawer).await.code, 0);
}

#[test]
fn test_hung_call_does_not_block_runtime_shutdown() {
    let factory = ScriptedFactory::new();
    factory.script("OpenCashDrawer", Outcome::Hang(Duration::from_secs(6)));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let reply = runtime.block_on(async {
        let session = open_session(&factory, Duration::from_millis(100)).await;
        let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
        session.shutdown().await;
        reply
    });
    assert_eq!(reply.code, 999);

    let started = Instant::now();
    drop(runtime);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_nonzero_status_is_not_a_failure_of_the_handle() {
    let factory = ScriptedFactory::new();
    factory.script("PrintZReport", Outcome::Code(7));
    let session = open_session(&factory, SHORT).await;

    let reply = session.execute(DeviceCommand::PrintZReport).await;
    assert_eq!(reply.code, 7);
    assert_eq!(factory.created(), 1);
    assert_eq!(session.status().reload_count, 0);
}

#[tokio::test]
async fn test_failed_construction_is_reported_then_retried() {
    let factory = ScriptedFactory::new();
    factory.fail_creates(1);
    let session = open_session(&factory, SHORT).await;
    assert!(!session.is_loaded());
    assert_eq!(
        session.status().last_init_error.as_deref(),
        Some("Failed to load device driver: driver not registered")
    );

    // First call retries construction and succeeds
    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    assert_eq!(reply.code, 0);
    assert!(session.is_loaded());
    assert_eq!(session.status().last_init_error, None);
}

#[tokio::test]
async fn test_persistent_construction_failure_surfaces_init_error() {
    let factory = ScriptedFactory::new();
    factory.fail_creates(2);
    let session = open_session(&factory, SHORT).await;

    let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
    assert_eq!(reply.code, 999);
    assert_eq!(reply.message, "Failed to load device driver: driver not registered");
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn test_unload_suppresses_until_explicit_load() {
    let factory = ScriptedFactory::new();
    let session = open_session(&factory, SHORT).await;

    session.unload().await;
    assert!(!session.is_loaded());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(factory.released(), 1);

    for _ in 0..3 {
        let reply = session.execute(DeviceCommand::OpenCashDrawer).await;
        assert_eq!((reply.code, reply.message.as_str()), (999, NOT_LOADED_MESSAGE));
    }
    let reply = session.fiscal_info(3).await;
    assert_eq!(reply.code, 999);
    // No construction and no device traffic while suppressed
    assert_eq!(factory.created(), 1);
    assert!(factory.calls().is_empty());

    assert!(session.load().await);
    assert_eq!(factory.created(), 2);
    assert_eq!(session.execute(DeviceCommand::OpenCashDrawer).await.code, 0);
}

#[tokio::test]
async fn test_load_replaces_a_live_handle() {
    let factory = ScriptedFactory::new();
    let session = open_session(&factory, SHORT).await;

    assert!(session.load().await);
    assert_eq!(factory.created(), 2);
    // Release of the old handle runs on the blocking pool
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(factory.released(), 1);
}

#[tokio::test]
async fn test_constructions_never_overlap() {
    let factory = ScriptedFactory::new();
    factory.set_create_delay(Duration::from_millis(20));
    let session = Arc::new(DeviceSession::new(factory.arc(), SHORT));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                session.load().await;
            } else {
                session.execute(DeviceCommand::OpenCashDrawer).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(factory.max_concurrent_constructions(), 1);
    assert!(session.is_loaded());
}

#[tokio::test]
async fn test_calls_are_serialised() {
    let factory = ScriptedFactory::new();
    factory.script("PrintXReport", Outcome::Hang(Duration::from_millis(100)));
    let session = open_session(&factory, Duration::from_secs(5)).await;

    let slow = {
        let session = session.clone();
        tokio::spawn(async move { session.execute(DeviceCommand::PrintXReport).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let fast = session.execute(DeviceCommand::OpenCashDrawer).await;

    assert_eq!(slow.await.unwrap().code, 0);
    assert_eq!(fast.code, 0);
    assert_eq!(factory.calls(), vec!["PrintXReport", "OpenCashDrawer"]);
}
