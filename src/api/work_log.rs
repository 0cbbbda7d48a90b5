use crate::api::parse_id;
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{StatusChangeResponse, TodayWorkListResponse};
use crate::response::{ErrorBody, ok};
use crate::state::AppState;
use actix_web::{HttpResponse, web};

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/work-logs/{id}/check-in",
    params(("id" = String, Path, description = "Work log id")),
    responses(
        (status = 200, description = "Shift moved to working", body = StatusChangeResponse),
        (status = 400, description = "Shift is not scheduled or id is malformed", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Shift belongs to another user", body = ErrorBody),
        (status = 404, description = "Shift not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WorkLog"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "work log id")?;
    let result = state.work_logs.check_in(auth.user_id, id).await?;
    Ok(ok(result))
}

/// Check-out endpoint
#[utoipa::path(
    patch,
    path = "/api/work-logs/{id}/check-out",
    params(("id" = String, Path, description = "Work log id")),
    responses(
        (status = 200, description = "Shift moved to done", body = StatusChangeResponse),
        (status = 400, description = "Shift is not working or id is malformed", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Shift belongs to another user", body = ErrorBody),
        (status = 404, description = "Shift not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WorkLog"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "work log id")?;
    let result = state.work_logs.check_out(auth.user_id, id).await?;
    Ok(ok(result))
}

/// Today's shifts of the caller
#[utoipa::path(
    get,
    path = "/api/work-logs/today",
    responses(
        (status = 200, description = "Shifts of the current business day", body = TodayWorkListResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WorkLog"
)]
pub async fn today(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let list = state.work_logs.today(auth.user_id).await?;
    Ok(ok(list))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{Fixture, SECRET, init_app, request};
    use crate::auth::jwt::issue_token;
    use crate::model::work_log::ShiftStatus;
    use crate::models::TokenType;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::Value;
    use uuid::Uuid;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 24)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[actix_web::test]
    async fn test_check_in_then_check_out() {
        let fx = Fixture::new(at(13, 55));
        let user = fx.store.add_user(None);
        let shift = fx.store.add_shift(user, None, at(14, 0), at(18, 0), ShiftStatus::Scheduled);
        let app = init_app!(fx);

        let req = request()
            .method(actix_web::http::Method::POST)
            .uri(&format!("/api/work-logs/{shift}/check-in"))
            .insert_header(fx.bearer(user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["resultType"], "SUCCESS");
        assert_eq!(body["success"]["status"], "working");
        assert_eq!(body["success"]["workLogId"], shift.to_string());
        assert_eq!(body["success"]["message"], "출근 처리되었습니다.");

        let req = request()
            .method(actix_web::http::Method::PATCH)
            .uri(&format!("/api/work-logs/{shift}/check-out"))
            .insert_header(fx.bearer(user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"]["status"], "done");
        assert_eq!(fx.store.status_of(shift), Some(ShiftStatus::Done));
    }

    #[actix_web::test]
    async fn test_second_check_in_reports_current_status() {
        let fx = Fixture::new(at(14, 5));
        let user = fx.store.add_user(None);
        let shift = fx.store.add_shift(user, None, at(14, 0), at(18, 0), ShiftStatus::Working);
        let app = init_app!(fx);

        let req = request()
            .method(actix_web::http::Method::POST)
            .uri(&format!("/api/work-logs/{shift}/check-in"))
            .insert_header(fx.bearer(user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["resultType"], "FAIL");
        assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");
        assert_eq!(body["error"]["data"]["currentStatus"], "working");
    }

    #[actix_web::test]
    async fn test_ownership_and_lookup_failures() {
        let fx = Fixture::new(at(13, 55));
        let owner = fx.store.add_user(None);
        let other = fx.store.add_user(None);
        let shift = fx.store.add_shift(owner, None, at(14, 0), at(18, 0), ShiftStatus::Scheduled);
        let app = init_app!(fx);

        let cases = [
            (shift.to_string(), other, StatusCode::FORBIDDEN),
            (Uuid::new_v4().to_string(), owner, StatusCode::NOT_FOUND),
            ("not-an-id".to_string(), owner, StatusCode::BAD_REQUEST),
        ];
        for (id, caller, expected) in cases {
            let req = request()
                .method(actix_web::http::Method::POST)
                .uri(&format!("/api/work-logs/{id}/check-in"))
                .insert_header(fx.bearer(caller))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "{id}");
        }
        assert_eq!(fx.store.status_of(shift), Some(ShiftStatus::Scheduled));
    }

    #[actix_web::test]
    async fn test_missing_or_refresh_token_is_unauthorized() {
        let fx = Fixture::new(at(9, 0));
        let user = fx.store.add_user(None);
        let app = init_app!(fx);

        let req = request().uri("/api/work-logs/today").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let refresh = issue_token(user, TokenType::Refresh, SECRET, 600);
        let req = request()
            .uri("/api/work-logs/today")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_today_lists_only_todays_shifts() {
        let fx = Fixture::new(at(9, 0));
        let user = fx.store.add_user(None);
        let posting = fx.store.add_posting("CU 홍대점", 10_000);
        fx.store.add_shift(user, Some(posting), at(14, 0), at(18, 0), ShiftStatus::Scheduled);
        let yesterday = at(14, 0) - chrono::Duration::days(1);
        fx.store.add_shift(user, Some(posting), yesterday, yesterday + chrono::Duration::hours(2), ShiftStatus::Done);
        let app = init_app!(fx);

        let req = request()
            .uri("/api/work-logs/today")
            .insert_header(fx.bearer(user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let today = &body["success"];
        assert_eq!(today["date"], "2026-01-24");
        assert_eq!(today["totalCount"], 1);
        assert_eq!(today["schedules"][0]["workplace"], "CU 홍대점");
        assert_eq!(today["schedules"][0]["startTime"], "14:00");
        assert_eq!(today["schedules"][0]["totalWage"], 40_000);
        assert_eq!(today["expectedIncome"], 40_000);
    }
}
