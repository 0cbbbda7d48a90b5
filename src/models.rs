use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::engine::income::BrandIncome;
use crate::model::schedule::{DayOfWeek, RepeatKind};
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::ShiftStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub sub: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/* =========================
Work logs
========================= */

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResponse {
    pub work_log_id: Uuid,
    #[schema(example = "working")]
    pub status: ShiftStatus,
    #[schema(example = "근무 중")]
    pub status_label: String,
    #[schema(example = "출근 처리되었습니다.")]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayShiftResponse {
    pub work_log_id: Uuid,
    pub status: ShiftStatus,
    #[schema(example = "예정")]
    pub status_label: String,
    #[schema(example = "CU 홍대점")]
    pub workplace: String,
    #[schema(example = "14:00")]
    pub start_time: String,
    #[schema(example = "18:00")]
    pub end_time: String,
    #[schema(example = 4.0)]
    pub work_hours: f64,
    #[schema(example = 11000)]
    pub hourly_wage: i64,
    #[schema(example = 44000)]
    pub total_wage: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayWorkListResponse {
    #[schema(example = "2026-01-24", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub schedules: Vec<TodayShiftResponse>,
    pub total_count: usize,
    pub total_work_minutes: i64,
    pub expected_income: i64,
}

/* =========================
Income
========================= */

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Month to report, `YYYY-MM`. Defaults to the current month.
    #[schema(example = "2026-01")]
    pub month: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomeDashboardResponse {
    #[schema(example = "2026-01")]
    pub month: String,
    #[schema(example = 1000000)]
    pub income_goal: i64,
    #[schema(example = 25000)]
    pub expected_income: i64,
    #[schema(example = 20000)]
    pub actual_income: i64,
    pub breakdown: Vec<BrandIncome>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncomeGoal {
    /// Non-negative whole number, or null to clear the goal.
    #[schema(example = 1000000, value_type = Option<i64>)]
    pub income_goal: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomeGoalResponse {
    #[schema(example = 1000000)]
    pub income_goal: Option<i64>,
}

/* =========================
Schedules
========================= */

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSchedule {
    #[schema(example = "CU 홍대점")]
    pub workplace: Option<String>,
    #[schema(example = "2026-02-10", value_type = Option<String>, format = "date")]
    pub work_date: Option<NaiveDate>,
    #[schema(example = "14:00-18:00")]
    pub work_time: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub repeat_type: Option<RepeatKind>,
    /// Seven `0`/`1` characters, Monday first.
    #[schema(example = "1010100")]
    pub repeat_days: Option<String>,
    #[schema(example = 11000)]
    pub hourly_wage: Option<i64>,
    #[schema(example = "오픈 조")]
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScheduleFromWorkLog {
    pub user_work_log_id: Uuid,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSchedule {
    pub workplace: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub work_date: Option<NaiveDate>,
    pub work_time: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub repeat_type: Option<RepeatKind>,
    pub repeat_days: Option<String>,
    pub hourly_wage: Option<i64>,
    pub memo: Option<String>,
}

impl UpdateSchedule {
    pub fn is_empty(&self) -> bool {
        self.workplace.is_none()
            && self.work_date.is_none()
            && self.work_time.is_none()
            && self.day_of_week.is_none()
            && self.repeat_type.is_none()
            && self.repeat_days.is_none()
            && self.hourly_wage.is_none()
            && self.memo.is_none()
    }

    pub fn touches_recurrence(&self) -> bool {
        self.repeat_type.is_some() || self.repeat_days.is_some()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: Uuid,
    #[schema(example = "CU 홍대점")]
    pub workplace: String,
    #[schema(example = "2026-02-10", value_type = Option<String>, format = "date")]
    pub work_date: Option<NaiveDate>,
    #[schema(example = "14:00-18:00")]
    pub work_time: String,
    #[schema(example = 11000)]
    pub hourly_wage: i64,
    #[schema(example = 44000)]
    pub estimated_wage: i64,
    pub memo: String,
}

/* =========================
Settlements
========================= */

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SettlementFilter {
    #[default]
    All,
    Waiting,
    Paid,
    Unpaid,
}

impl SettlementFilter {
    pub fn status(&self) -> Option<SettlementStatus> {
        match self {
            SettlementFilter::All => None,
            SettlementFilter::Waiting => Some(SettlementStatus::Waiting),
            SettlementFilter::Paid => Some(SettlementStatus::Paid),
            SettlementFilter::Unpaid => Some(SettlementStatus::Unpaid),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SettlementListQuery {
    /// Settlement status filter
    pub status: Option<SettlementFilter>,
    /// `latest` (default) or `oldest`
    pub sort: Option<SortOrder>,
    /// Work log id of the last item from the previous page
    pub cursor: Option<String>,
    /// Page size, 1 to 20
    #[schema(example = 20)]
    pub size: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementItem {
    pub work_log_id: Uuid,
    #[schema(example = "2026-01-24", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = "이디야커피(상봉점)")]
    pub store_name: String,
    #[schema(example = 240)]
    pub work_minutes: i64,
    #[schema(example = 44000)]
    pub expected_income: i64,
    /// Paid income under the canonical definition (expected income once paid).
    #[schema(example = 44000)]
    pub actual_income: i64,
    /// Sum of the ledger entries recorded for this shift.
    #[schema(example = 45000)]
    pub recorded_amount: i64,
    pub settlement_status: SettlementStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementListResponse {
    pub items: Vec<SettlementItem>,
    /// Sum of `expectedIncome` over `items`.
    #[schema(example = 88000)]
    pub total_expected_income: i64,
    /// Sum of `actualIncome` over `items`.
    #[schema(example = 44000)]
    pub total_actual_income: i64,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettlementStatus {
    pub status: SettlementStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementUpdateResponse {
    pub posting_id: Uuid,
    pub settlement_status: SettlementStatus,
    /// Shifts moved from `done` to `settled` by this update.
    #[schema(example = 3)]
    pub settled_shifts: u64,
}
