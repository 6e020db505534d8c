//! Device diagnostics
//!
//! | Path | Method | Reply |
//! |------|--------|-------|
//! | /device/load | POST | `{ "loaded": bool }` |
//! | /device/unload | POST | `{ "loaded": false }` |
//! | /device/status | GET | [`SessionStatus`] |

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::session::SessionStatus;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/device/load", post(load))
        .route("/device/unload", post(unload))
        .route("/device/status", get(status))
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    loaded: bool,
}

async fn load(State(state): State<ServerState>) -> Json<LoadResponse> {
    let loaded = state.session.load().await;
    Json(LoadResponse { loaded })
}

async fn unload(State(state): State<ServerState>) -> Json<LoadResponse> {
    state.session.unload().await;
    Json(LoadResponse { loaded: false })
}

async fn status(State(state): State<ServerState>) -> Json<SessionStatus> {
    Json(state.session.status())
}
