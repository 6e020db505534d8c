//! Logging setup
//!
//! Console output always; with a log directory also:
//! - `app/fiscal-server.YYYY-MM-DD` - everything except access lines
//! - `access/access.YYYY-MM-DD` - one line per HTTP request (`http_access` target)
//!
//! Rotated daily, files older than [`RETENTION_DAYS`] are deleted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

/// Days a rotated log file is kept
pub const RETENTION_DAYS: i64 = 14;

const ACCESS_TARGET: &str = "http_access";

/// Delete rotated files older than [`RETENTION_DAYS`] under `log_dir/{app,access}`
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(RETENTION_DAYS);
    let mut removed = 0;

    for sub in ["app", "access"] {
        let dir = log_dir.join(sub);
        if !dir.exists() {
            continue;
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // Rotated names end in `.YYYY-MM-DD`
            let Some((_, date_part)) = name.rsplit_once('.') else {
                continue;
            };
            if let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                && date < cutoff
            {
                fs::remove_file(&path)?;
                tracing::info!(file = %name, "Deleted old log file");
                removed += 1;
            }
        }
    }

    Ok(removed)
}

/// Initialise logging
///
/// `RUST_LOG` overrides `level`. Call once, from inside the tokio runtime when
/// `log_dir` is set (the cleanup task is spawned on it).
///
/// ```no_run
/// fiscal_server::init_logger_with_file("debug", false, None)?;
/// fiscal_server::init_logger_with_file("info", true, Some("./logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_filter(filter())
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter())
            .boxed()
    };

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(console).try_init()?;
        return Ok(());
    };

    let log_dir = Path::new(dir);
    let app_dir = log_dir.join("app");
    let access_dir = log_dir.join("access");
    fs::create_dir_all(&app_dir)?;
    fs::create_dir_all(&access_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "fiscal-server");
    let app_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(filter())
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != ACCESS_TARGET
        }))
        .boxed();

    let access_log = RollingFileAppender::new(Rotation::DAILY, access_dir, "access");
    let access_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(access_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == ACCESS_TARGET
        }))
        .boxed();

    tracing_subscriber::registry()
        .with(console)
        .with(app_layer)
        .with(access_layer)
        .try_init()?;

    tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    Ok(())
}

/// Console only
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

async fn periodic_cleanup(log_dir: PathBuf) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
    loop {
        interval.tick().await;
        match cleanup_old_logs(&log_dir) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Log cleanup finished"),
            Err(e) => tracing::error!(error = %e, "Failed to cleanup old logs"),
        }
    }
}
