//! axum middleware running the gate in front of the rest of the router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;

use super::connection::ConnectionHandle;
use super::{GeoGate, Verdict};
use crate::error_handling::Outcome;

/// Puts `gate` in front of every route of `router`.
pub fn with_geo_gate<S>(router: Router<S>, gate: Arc<GeoGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(gate, geo_gate_middleware))
}

/// Forwards allowed requests to `next` untouched and terminates the rest.
///
/// The peer address comes from `ConnectInfo<SocketAddr>`; without it, and
/// without trusted headers, the request is unresolvable and denied.
pub async fn geo_gate_middleware(
    State(gate): State<Arc<GeoGate>>,
    req: Request,
    next: Next,
) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match gate.evaluate(req.headers(), remote_addr) {
        Verdict::Forward => next.run(req).await,
        Verdict::Deny(_) => {
            let handle = req.extensions().get::<ConnectionHandle>().cloned();
            terminate(&gate, handle).await
        }
    }
}

/// Ends a denied request.
///
/// With a [`ConnectionHandle`] the connection is dropped and this future never
/// completes (it is dropped along with the connection). Without one, the
/// client gets an empty 403 and the connection is closed after it.
async fn terminate(gate: &GeoGate, handle: Option<ConnectionHandle>) -> Response {
    match handle {
        Some(handle) => {
            gate.stats().increment(Outcome::ClosedRaw);
            log::debug!("Dropping connection without response");
            handle.close();
            std::future::pending().await
        }
        None => {
            gate.stats().increment(Outcome::ClosedForbidden);
            log::debug!("No hijack capability on connection, answering 403");
            forbidden_response()
        }
    }
}

/// Empty 403 with `Connection: close`.
pub fn forbidden_response() -> Response {
    (StatusCode::FORBIDDEN, [(header::CONNECTION, "close")]).into_response()
}
