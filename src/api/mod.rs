//! REST API module
//!
//! HTTP surface for the company service. Compiled with the `server` feature.

pub mod company_routes;
pub mod error;
pub mod middleware;

pub use company_routes::create_company_router;
pub use error::ApiError;
pub use middleware::CallerIp;

use std::sync::Arc;

use axum::{middleware as axum_mw, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::services::CompanyService;

/// Build the full router: company routes nested under `prefix`, caller IP
/// capture, panic recovery and request tracing.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// caller address is available to gated writes.
pub fn build_router(service: Arc<CompanyService>, prefix: &str) -> Router {
    let routes = create_company_router(service);

    let prefix = prefix.trim().trim_end_matches('/');
    let app = if prefix.is_empty() {
        routes
    } else if prefix.starts_with('/') {
        Router::new().nest(prefix, routes)
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(middleware::handle_panic))
            .layer(axum_mw::from_fn(middleware::caller_ip)),
    )
}
