use crate::api::parse_id;
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{
    SettlementListQuery, SettlementListResponse, SettlementUpdateResponse, UpdateSettlementStatus,
};
use crate::response::{ErrorBody, ok};
use crate::state::AppState;
use actix_web::{HttpResponse, web};

/// Settlement history of the caller, cursor paginated
#[utoipa::path(
    get,
    path = "/api/settlements",
    params(SettlementListQuery),
    responses(
        (status = 200, description = "One page of work logs with settlement status", body = SettlementListResponse),
        (status = 400, description = "Invalid filter, sort or cursor", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settlement"
)]
pub async fn list_settlements(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<SettlementListQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .settlements
        .list(auth.user_id, query.into_inner())
        .await?;
    Ok(ok(page))
}

/// Record the settlement status of a posting
#[utoipa::path(
    patch,
    path = "/api/settlements/{postingId}",
    params(("postingId" = String, Path, description = "Posting id")),
    request_body = UpdateSettlementStatus,
    responses(
        (status = 200, description = "Status stored; paid settles finished shifts", body = SettlementUpdateResponse),
        (status = 400, description = "Unknown status or malformed id", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "No settlement record for this posting", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settlement"
)]
pub async fn update_settlement_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSettlementStatus>,
) -> AppResult<HttpResponse> {
    let posting_id = parse_id(&path, "posting id")?;
    let result = state
        .settlements
        .set_status(auth.user_id, posting_id, body.status)
        .await?;
    Ok(ok(result))
}
