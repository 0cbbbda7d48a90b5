use crate::engine::income::BrandIncome;
use crate::model::schedule::{DayOfWeek, RepeatKind};
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::ShiftStatus;
use crate::models::{
    CreateSchedule, CreateScheduleFromWorkLog, IncomeDashboardResponse, IncomeGoalResponse,
    ScheduleResponse, SettlementFilter, SettlementItem, SettlementListResponse,
    SettlementUpdateResponse, SortOrder, StatusChangeResponse, TodayShiftResponse,
    TodayWorkListResponse, UpdateIncomeGoal, UpdateSchedule, UpdateSettlementStatus,
};
use crate::response::{ErrorBody, ResultType};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Alba Tracker API",
        version = "1.0.0",
        description = r#"
## Part-time Work Tracker

Backend for people juggling part-time jobs: plan shifts, check in and out,
and see what the month is worth.

### Key Features
- **Work logs**
  - Today's shifts, check-in and check-out
  - Shifts past their start or end are reconciled automatically
- **Schedules**
  - One-off or recurring (daily, weekly, biweekly) schedules
- **Income**
  - Monthly goal, expected and paid income, per-brand breakdown
- **Settlements**
  - Payment status per posting, cursor-paginated history

### Security
Every endpoint requires a **JWT Bearer** access token.

### Response Format
Every response is wrapped as `{resultType, error, success}`.
"#,
    ),
    paths(
        crate::api::work_log::today,
        crate::api::work_log::check_in,
        crate::api::work_log::check_out,

        crate::api::income::dashboard,
        crate::api::income::update_income_goal,

        crate::api::schedule::create_schedule,
        crate::api::schedule::create_from_work_log,
        crate::api::schedule::update_schedule,
        crate::api::schedule::delete_schedule,

        crate::api::settlement::list_settlements,
        crate::api::settlement::update_settlement_status
    ),
    components(
        schemas(
            ResultType,
            ErrorBody,
            ShiftStatus,
            StatusChangeResponse,
            TodayShiftResponse,
            TodayWorkListResponse,
            BrandIncome,
            IncomeDashboardResponse,
            UpdateIncomeGoal,
            IncomeGoalResponse,
            RepeatKind,
            DayOfWeek,
            CreateSchedule,
            CreateScheduleFromWorkLog,
            UpdateSchedule,
            ScheduleResponse,
            SettlementStatus,
            SettlementFilter,
            SortOrder,
            SettlementItem,
            SettlementListResponse,
            UpdateSettlementStatus,
            SettlementUpdateResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "WorkLog", description = "Shift check-in, check-out and today list"),
        (name = "Income", description = "Income dashboard and goal"),
        (name = "Schedule", description = "Schedule management"),
        (name = "Settlement", description = "Settlement status and history"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
