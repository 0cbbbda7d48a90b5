use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{DashboardQuery, IncomeDashboardResponse, IncomeGoalResponse, UpdateIncomeGoal};
use crate::response::{ErrorBody, ok};
use crate::state::AppState;
use actix_web::{HttpResponse, web};

/// Monthly income dashboard
#[utoipa::path(
    get,
    path = "/api/income/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Goal, expected and paid income with a per-brand breakdown", body = IncomeDashboardResponse),
        (status = 400, description = "Month is not YYYY-MM", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Income"
)]
pub async fn dashboard(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> AppResult<HttpResponse> {
    let dashboard = state
        .income
        .dashboard(auth.user_id, query.month.as_deref())
        .await?;
    Ok(ok(dashboard))
}

/// Set or clear the monthly income goal
#[utoipa::path(
    patch,
    path = "/api/users/income-goal",
    request_body = UpdateIncomeGoal,
    responses(
        (status = 200, description = "Goal stored", body = IncomeGoalResponse),
        (status = 400, description = "Goal is negative or fractional", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Income"
)]
pub async fn update_income_goal(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<UpdateIncomeGoal>,
) -> AppResult<HttpResponse> {
    let stored = state
        .income
        .set_income_goal(auth.user_id, body.income_goal)
        .await?;
    Ok(ok(stored))
}
