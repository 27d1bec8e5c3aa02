use axum::{Router, routing::get};

pub mod balances;
pub mod creators;
pub mod licenses;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/licenses", licenses::router())
        .nest("/creators", creators::router())
        .nest("/balances", balances::router())
}
