use crate::api::parse_id;
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{CreateSchedule, CreateScheduleFromWorkLog, ScheduleResponse, UpdateSchedule};
use crate::response::{ErrorBody, created, ok};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use serde_json::json;

/// Create a manual schedule
#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = CreateSchedule,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 400, description = "Invalid recurrence, time range or wage", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn create_schedule(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateSchedule>,
) -> AppResult<HttpResponse> {
    let schedule = state
        .schedules
        .create_manual(auth.user_id, body.into_inner())
        .await?;
    Ok(created(schedule))
}

/// Copy one of the caller's shifts into a new schedule
#[utoipa::path(
    post,
    path = "/api/schedules/from-work-log",
    request_body = CreateScheduleFromWorkLog,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Work log not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn create_from_work_log(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<CreateScheduleFromWorkLog>,
) -> AppResult<HttpResponse> {
    let schedule = state
        .schedules
        .create_from_work_log(auth.user_id, body.user_work_log_id)
        .await?;
    Ok(created(schedule))
}

/// Partially update a schedule
#[utoipa::path(
    patch,
    path = "/api/schedules/{id}",
    params(("id" = String, Path, description = "Schedule id")),
    request_body = UpdateSchedule,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 400, description = "Empty or invalid update", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Schedule not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn update_schedule(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSchedule>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "schedule id")?;
    let schedule = state
        .schedules
        .update(auth.user_id, id, body.into_inner())
        .await?;
    Ok(ok(schedule))
}

/// Delete a schedule and its shifts
#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id" = String, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule deleted", body = Object, example = json!({
            "scheduleId": "0d9e4a52-3f0b-4c57-9a2e-6c1b1f3c5b10"
        })),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Schedule not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn delete_schedule(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "schedule id")?;
    state.schedules.delete(auth.user_id, id).await?;
    Ok(ok(json!({ "scheduleId": id })))
}
