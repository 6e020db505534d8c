//! HTTP server lifecycle

use std::net::SocketAddr;

use axum::ServiceExt;
use axum::extract::Request;

use crate::api::build_service;
use crate::core::{Config, Result, ServerError, ServerState};

pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Serve until Ctrl-C, then release the device
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, "Fiscal server listening");

        let service = build_service(self.state.clone());
        let served = axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        tracing::info!("HTTP server stopped; shutting down device session");
        self.state.session.shutdown().await;

        served.map_err(ServerError::Serve)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutting down...");
}
