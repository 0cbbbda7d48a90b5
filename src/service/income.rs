use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::income::{MonthRange, aggregate};
use crate::error::{AppError, AppResult};
use crate::models::{IncomeDashboardResponse, IncomeGoalResponse};
use crate::repository::{UserRepository, WorkLogRepository};

pub struct IncomeService {
    work_logs: Arc<dyn WorkLogRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl IncomeService {
    pub fn new(
        work_logs: Arc<dyn WorkLogRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            work_logs,
            users,
            clock,
        }
    }

    #[instrument(name = "income_dashboard", skip(self))]
    pub async fn dashboard(
        &self,
        user_id: Uuid,
        month: Option<&str>,
    ) -> AppResult<IncomeDashboardResponse> {
        let range = MonthRange::resolve(month, self.clock.today())?;
        let income_goal = self
            .users
            .income_goal(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?
            .unwrap_or(0);

        let details = self
            .work_logs
            .find_details_between(user_id, range.start, range.end)
            .await?;
        let totals = aggregate(&details);
        debug!(shifts = details.len(), "aggregated month");

        Ok(IncomeDashboardResponse {
            month: range.label(),
            income_goal,
            expected_income: totals.expected_income,
            actual_income: totals.actual_income,
            breakdown: totals.breakdown,
        })
    }

    /// Accepts a whole, non-negative number or `None` to clear the goal.
    #[instrument(name = "income_goal_update", skip(self))]
    pub async fn set_income_goal(
        &self,
        user_id: Uuid,
        goal: Option<f64>,
    ) -> AppResult<IncomeGoalResponse> {
        let goal = goal.map(whole_amount).transpose()?;
        if !self.users.set_income_goal(user_id, goal).await? {
            return Err(AppError::not_found("user"));
        }
        info!(?goal, "income goal stored");
        Ok(IncomeGoalResponse { income_goal: goal })
    }
}

fn whole_amount(value: f64) -> AppResult<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(AppError::validation("incomeGoal must be a whole number"));
    }
    if value < 0.0 {
        return Err(AppError::validation("incomeGoal must not be negative"));
    }
    if value > i64::MAX as f64 {
        return Err(AppError::validation("incomeGoal is too large"));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::settlement::SettlementStatus;
    use crate::model::work_log::ShiftStatus;
    use crate::repository::memory::MemoryStore;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(month: u32, day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, month, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, IncomeService) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(at(1, 28, 12)));
        let service = IncomeService::new(store.clone(), store.clone(), clock);
        (store, service)
    }

    #[actix_web::test]
    async fn test_paid_and_unpaid_month() {
        let (store, service) = setup();
        let user = store.add_user(None);
        let mega = store.add_posting("메가MGC커피 상수역점", 10_000);
        let cu = store.add_posting("CU 홍대점", 10_000);
        store.set_settlement(user, mega, SettlementStatus::Paid);
        store.set_settlement(user, cu, SettlementStatus::Unpaid);
        // 120 min -> 20000, 30 min -> 5000
        store.add_shift(user, Some(mega), at(1, 5, 9), at(1, 5, 11), ShiftStatus::Settled);
        let half = at(1, 6, 9) + chrono::Duration::minutes(30);
        store.add_shift(user, Some(cu), at(1, 6, 9), half, ShiftStatus::Done);
        // other month, ignored
        store.add_shift(user, Some(mega), at(2, 1, 9), at(2, 1, 18), ShiftStatus::Settled);

        let dashboard = service.dashboard(user, None).await.unwrap();
        assert_eq!(dashboard.month, "2026-01");
        assert_eq!(dashboard.income_goal, 0);
        assert_eq!(dashboard.expected_income, 25_000);
        assert_eq!(dashboard.actual_income, 20_000);
        assert_eq!(dashboard.breakdown.len(), 1);
        assert_eq!(dashboard.breakdown[0].key, "메가MGC커피");
    }

    #[actix_web::test]
    async fn test_explicit_month_and_bad_month() {
        let (store, service) = setup();
        let user = store.add_user(Some(500_000));
        let posting = store.add_posting("GS25 합정점", 12_000);
        store.add_shift(user, Some(posting), at(2, 1, 9), at(2, 1, 10), ShiftStatus::Done);

        let feb = service.dashboard(user, Some("2026-02")).await.unwrap();
        assert_eq!(feb.income_goal, 500_000);
        assert_eq!(feb.expected_income, 12_000);
        assert_eq!(feb.actual_income, 0);

        let err = service.dashboard(user, Some("2026-2")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[actix_web::test]
    async fn test_income_goal_validation() {
        let (store, service) = setup();
        let user = store.add_user(None);

        let stored = service.set_income_goal(user, Some(1_000_000.0)).await.unwrap();
        assert_eq!(stored.income_goal, Some(1_000_000));

        for bad in [-1.0, 10.5, f64::NAN, f64::INFINITY] {
            let err = service.set_income_goal(user, Some(bad)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{bad}");
        }

        let cleared = service.set_income_goal(user, None).await.unwrap();
        assert_eq!(cleared.income_goal, None);

        let err = service
            .set_income_goal(Uuid::new_v4(), Some(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
