use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use echoledger_core::AssetId;
use echoledger_licensing::{BuyUsage, InitializeVoice, UseVoice};

use crate::app::dto::{
    self, LicenseResponse, LicenseStateResponse, PurchaseResponse, UsageResponse,
    UseGrantResponse,
};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_license).get(list_licenses))
        .route("/:asset_id", get(get_license))
        .route("/:asset_id/quote", get(quote))
        .route("/:asset_id/verify", get(verify))
        .route("/:asset_id/purchases", post(purchase))
        .route("/:asset_id/uses", post(use_voice))
}

/// Register a voice; the caller becomes its creator.
pub async fn create_license(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateLicenseRequest>,
) -> axum::response::Response {
    let asset_id = match body.asset_id.as_deref() {
        Some(raw) => match dto::parse_asset_id(raw) {
            Ok(id) => id,
            Err(resp) => return resp,
        },
        None => AssetId::new(),
    };
    let license_type = match body.license_type.resolve() {
        Ok(t) => t,
        Err(e) => return errors::licensing_error_to_response(e),
    };

    let cmd = InitializeVoice {
        asset_id,
        creator: actor.actor_id(),
        price_per_use: body.price_per_use,
        max_uses: body.max_uses,
        license_type,
        resale_allowed: body.resale_allowed,
        royalty_bps: body.royalty_bps,
        consent_confirmed: body.consent_confirmed,
        metadata: body.metadata,
        occurred_at: Utc::now(),
    };

    match services.host.initialize(&cmd) {
        Ok(license) => {
            (StatusCode::CREATED, Json(LicenseResponse::from(&license))).into_response()
        }
        Err(e) => errors::host_error_to_response(e),
    }
}

/// Catalog view (eventually consistent with the ledger).
pub async fn list_licenses(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let mut summaries = services.catalog.list();
    summaries.sort_by_key(|s| s.asset_id);
    Json(summaries).into_response()
}

pub async fn get_license(
    Extension(services): Extension<Arc<AppServices>>,
    Path(asset_id): Path<String>,
    Query(query): Query<dto::StateQuery>,
) -> axum::response::Response {
    let asset_id = match dto::parse_asset_id(&asset_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let buyer = match query.buyer.as_deref().map(dto::parse_actor_id).transpose() {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.host.query_state(&asset_id, buyer) {
        Ok(state) => Json(LicenseStateResponse {
            license: LicenseResponse::from(&state.license),
            usage: state.usage.as_ref().map(UsageResponse::from),
        })
        .into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}

pub async fn quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(asset_id): Path<String>,
    Query(query): Query<dto::QuoteQuery>,
) -> axum::response::Response {
    let asset_id = match dto::parse_asset_id(&asset_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.host.quote(&asset_id, query.uses) {
        Ok(cost) => Json(serde_json::json!({
            "asset_id": asset_id,
            "uses": query.uses,
            "cost": cost,
        }))
        .into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}

pub async fn verify(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(asset_id): Path<String>,
    Query(query): Query<dto::VerifyQuery>,
) -> axum::response::Response {
    let asset_id = match dto::parse_asset_id(&asset_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let holder = match query.holder.as_deref().map(dto::parse_actor_id).transpose() {
        Ok(h) => h.unwrap_or(actor.actor_id()),
        Err(resp) => return resp,
    };

    match services.host.verify_license(&asset_id, holder) {
        Ok(verification) => Json(verification).into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}

/// Prepay uses for the caller; the cost moves from caller to creator.
pub async fn purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(asset_id): Path<String>,
    Json(body): Json<dto::PurchaseRequest>,
) -> axum::response::Response {
    let asset_id = match dto::parse_asset_id(&asset_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let cmd = BuyUsage {
        asset_id,
        buyer: actor.actor_id(),
        uses: body.uses,
        occurred_at: Utc::now(),
    };

    match services.host.buy_usage(&cmd) {
        Ok(purchase) => Json(PurchaseResponse::from(&purchase)).into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}

/// Consume one of the caller's uses. A `403 no_uses_remaining` is final:
/// buy more uses instead of retrying.
pub async fn use_voice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(asset_id): Path<String>,
) -> axum::response::Response {
    let asset_id = match dto::parse_asset_id(&asset_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let cmd = UseVoice {
        asset_id,
        user: actor.actor_id(),
        occurred_at: Utc::now(),
    };

    let granted = services.host.gated(&cmd, |record| UseGrantResponse {
        granted: true,
        asset_id: record.asset_id(),
        user: record.buyer(),
        remaining_uses: record.remaining_uses(),
    });

    match granted {
        Ok(grant) => Json(grant).into_response(),
        Err(e) => errors::host_error_to_response(e),
    }
}
