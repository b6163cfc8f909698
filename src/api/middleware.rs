//! Request middleware: caller address capture and panic recovery.

use std::any::Any;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

/// Remote address of the caller, port stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIp(pub IpAddr);

/// Copy the transport peer address into a [`CallerIp`] request extension.
///
/// Needs the router to be served with `into_make_service_with_connect_info`.
/// Without connect info no extension is added and gated writes are refused.
pub async fn caller_ip(mut req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical());

    if let Some(ip) = peer {
        req.extensions_mut().insert(CallerIp(ip));
    }
    next.run(req).await
}

/// Response for a handler panic caught by `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "PANIC recovered");

    ApiError::internal("Internal server error").into_response()
}
