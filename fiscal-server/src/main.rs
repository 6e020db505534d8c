use std::sync::Arc;

use fiscal_device::SimulatedFactory;
use fiscal_server::{Config, Server, ServerState, init_logger_with_file, print_banner, setup_environment};

/// Register number reported by the built-in simulated device
const SIMULATED_REGISTER_ENV: &str = "SIMULATED_REGISTER_NO";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env, then configuration (logging depends on it)
    setup_environment();
    let (config, source) = Config::load()?;

    // 2. Logging
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    source.log();

    print_banner();
    tracing::info!(
        port = config.http_port,
        com_timeout_seconds = config.com_timeout_seconds,
        radison_mode = config.radison_mode,
        environment = %config.environment,
        "Fiscal server starting"
    );

    // 3. Device session
    let register_no =
        std::env::var(SIMULATED_REGISTER_ENV).unwrap_or_else(|_| "0001".to_string());
    let factory = Arc::new(SimulatedFactory::new(&register_no));
    let state = ServerState::initialize(config.clone(), factory).await;

    // 4. HTTP
    if let Err(e) = Server::with_state(config, state).run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
