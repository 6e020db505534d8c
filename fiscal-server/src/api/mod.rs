//! HTTP surface
//!
//! - [`fiscal`] - `/fiscalCommand` and `/fullReceipt`
//! - [`device`] - explicit load / unload and session status
//! - [`health`] - liveness

pub mod device;
pub mod fiscal;
pub mod health;
pub mod middleware;

use axum::Router;
use axum::body::Body;
use axum::middleware as axum_middleware;
use http::{HeaderName, Request, Uri};
use tower::Layer;
use tower::util::{MapRequest, MapRequestLayer};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::{ServerError, ServerState};

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        http::HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(fiscal::router())
        .merge(device::router())
        .merge(health::router())
        .fallback(not_found)
}

async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Routes plus middleware, bound to `state`
pub fn build_app(state: ServerState) -> Router {
    build_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(middleware::log_request))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
}

/// The app behind path normalisation
pub type FiscalService = MapRequest<Router, fn(Request<Body>) -> Request<Body>>;

/// Complete service: duplicate slashes are collapsed before routing, so
/// `//fiscalCommand` reaches `/fiscalCommand`
pub fn build_service(state: ServerState) -> FiscalService {
    let normalise: fn(Request<Body>) -> Request<Body> = collapse_slashes;
    MapRequestLayer::new(normalise).layer(build_app(state))
}

fn collapse_slashes(mut request: Request<Body>) -> Request<Body> {
    let uri = request.uri();
    if !uri.path().contains("//") {
        return request;
    }

    let mut path = String::with_capacity(uri.path().len());
    for c in uri.path().chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    match path_and_query.parse() {
        Ok(pq) => {
            parts.path_and_query = Some(pq);
            match Uri::from_parts(parts) {
                Ok(normalised) => *request.uri_mut() = normalised,
                Err(e) => tracing::warn!(error = %e, "Could not rebuild request URI"),
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not normalise request path"),
    }
    request
}
