use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use echoledger_infra::projections::CreatorEarnings;

use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/:actor_id/earnings", get(earnings))
}

/// Creator totals from the catalog; zeros for an actor with no sales yet.
pub async fn earnings(
    Extension(services): Extension<Arc<AppServices>>,
    Path(actor_id): Path<String>,
) -> axum::response::Response {
    let creator = match dto::parse_actor_id(&actor_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let earnings = services.catalog.earnings_of(&creator).unwrap_or(CreatorEarnings {
        creator,
        ..CreatorEarnings::default()
    });
    Json(earnings).into_response()
}
