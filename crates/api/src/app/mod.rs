//! Application wiring: ledger services, routes and the auth layer.
//!
//! - `services.rs`: ledger host, journal, bus and catalog projection
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: ledger errors as JSON responses

use std::io;
use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router.
pub fn build_app(config: &ApiConfig) -> io::Result<Router> {
    let jwt = Arc::new(echoledger_auth::Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services(config)?);

    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new()))
}
