use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/deposit", post(deposit))
        .route("/me", get(me))
}

/// Dev funding: credit the caller's balance. Disabled unless configured.
pub async fn deposit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::DepositRequest>,
) -> axum::response::Response {
    if !services.dev_funding {
        return errors::json_error(StatusCode::FORBIDDEN, "dev_funding_disabled", "deposits are disabled");
    }

    match services.host.deposit(actor.actor_id(), body.amount) {
        Ok(balance) => Json(serde_json::json!({
            "actor_id": actor.actor_id(),
            "balance": balance,
        }))
        .into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.host.balance_of(actor.actor_id()) {
        Ok(balance) => Json(serde_json::json!({
            "actor_id": actor.actor_id(),
            "balance": balance,
        }))
        .into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}
