use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use echoledger_infra::HostError;
use echoledger_licensing::LicensingError;

pub fn host_error_to_response(err: HostError) -> axum::response::Response {
    match err {
        HostError::Licensing(e) => licensing_error_to_response(e),
        HostError::Funding(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "funding_rejected", e.to_string())
        }
        e @ (HostError::Store(_) | HostError::Deserialize(_) | HostError::Poisoned) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "ledger_unavailable", e.to_string())
        }
    }
}

pub fn licensing_error_to_response(err: LicensingError) -> axum::response::Response {
    let status = match &err {
        LicensingError::LicenseNotFound | LicensingError::UsageRecordNotFound => {
            StatusCode::NOT_FOUND
        }
        LicensingError::AlreadyInitialized => StatusCode::CONFLICT,
        LicensingError::InvalidParameters(_) | LicensingError::ConsentNotConfirmed => {
            StatusCode::BAD_REQUEST
        }
        LicensingError::InsufficientSupply { .. }
        | LicensingError::InsufficientFunds(_)
        | LicensingError::ArithmeticOverflow => StatusCode::UNPROCESSABLE_ENTITY,
        LicensingError::NoUsesRemaining => StatusCode::FORBIDDEN,
        LicensingError::InconsistentEvent(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if err.is_absolute_denial() {
        return (
            status,
            axum::Json(json!({
                "error": err.kind(),
                "message": err.to_string(),
                "action": "purchase_more",
            })),
        )
            .into_response();
    }
    json_error(status, err.kind(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
}
