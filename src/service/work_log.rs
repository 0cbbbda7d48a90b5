use std::sync::Arc;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::income::{expected_income, work_hours};
use crate::engine::transition::{ShiftWindow, next_status};
use crate::error::{AppError, AppResult};
use crate::model::schedule::format_hhmm;
use crate::model::work_log::{ShiftAction, ShiftStatus, WorkLogDetail};
use crate::models::{StatusChangeResponse, TodayShiftResponse, TodayWorkListResponse};
use crate::repository::{ScheduleRepository, WorkLogRepository};

pub struct WorkLogService {
    work_logs: Arc<dyn WorkLogRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
}

impl WorkLogService {
    pub fn new(
        work_logs: Arc<dyn WorkLogRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            work_logs,
            schedules,
            clock,
        }
    }

    #[instrument(name = "work_log_check_in", skip(self))]
    pub async fn check_in(&self, user_id: Uuid, id: Uuid) -> AppResult<StatusChangeResponse> {
        let status = self.apply_owner_action(user_id, id, ShiftAction::CheckIn).await?;
        Ok(status_change(id, status, "출근 처리되었습니다."))
    }

    #[instrument(name = "work_log_check_out", skip(self))]
    pub async fn check_out(&self, user_id: Uuid, id: Uuid) -> AppResult<StatusChangeResponse> {
        let status = self.apply_owner_action(user_id, id, ShiftAction::CheckOut).await?;
        Ok(status_change(id, status, "퇴근 처리되었습니다."))
    }

    /// Existence, then ownership, then the state guard, then a conditional
    /// write so a concurrent duplicate request cannot also succeed.
    async fn apply_owner_action(
        &self,
        user_id: Uuid,
        id: Uuid,
        action: ShiftAction,
    ) -> AppResult<ShiftStatus> {
        let log = self
            .work_logs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("work log"))?;

        if log.user_id != user_id {
            warn!(owner = %log.user_id, "caller does not own the work log");
            return Err(AppError::Forbidden(
                "work log belongs to another user".to_string(),
            ));
        }

        let window = ShiftWindow {
            start: log.start_time,
            end: log.end_time,
        };
        let next = next_status(log.status, action, self.clock.now(), window)?;

        if !self.work_logs.update_status_if(id, log.status, next).await? {
            let current = self
                .work_logs
                .find_by_id(id)
                .await?
                .map(|l| l.status)
                .unwrap_or(log.status);
            warn!(%current, %action, "lost the race for a status change");
            return Err(AppError::InvalidStateTransition {
                from: current,
                action,
            });
        }

        info!(from = %log.status, to = %next, "shift transitioned");
        Ok(next)
    }

    #[instrument(name = "work_log_today", skip(self))]
    pub async fn today(&self, user_id: Uuid) -> AppResult<TodayWorkListResponse> {
        let today = self.clock.today();
        self.materialize_recurring(user_id, today).await?;

        let tomorrow = today
            .succ_opt()
            .ok_or_else(|| anyhow!("no calendar day after {today}"))?;
        let details = self
            .work_logs
            .find_details_between(user_id, today, tomorrow)
            .await?;

        let schedules: Vec<TodayShiftResponse> = details.iter().map(today_entry).collect();
        // missed shifts stay listed but earn nothing
        let total_work_minutes: i64 = details
            .iter()
            .filter(|d| d.log.status != ShiftStatus::Absent)
            .filter_map(|d| d.log.effective_minutes())
            .sum();
        let expected_income: i64 = schedules
            .iter()
            .filter(|s| s.status != ShiftStatus::Absent)
            .map(|s| s.total_wage)
            .sum();

        Ok(TodayWorkListResponse {
            date: today,
            total_count: schedules.len(),
            total_work_minutes,
            expected_income,
            schedules,
        })
    }

    /// Creates today's shift for every recurring schedule that has an
    /// occurrence today and no shift yet.
    async fn materialize_recurring(&self, user_id: Uuid, today: NaiveDate) -> AppResult<()> {
        for schedule in self.schedules.list_recurring(user_id).await? {
            if !schedule.occurs_on(today)
                || self.work_logs.exists_for_schedule_on(schedule.id, today).await?
            {
                continue;
            }
            // a concurrent request may have inserted it since the check
            match self
                .work_logs
                .insert_for_schedule(user_id, schedule.id, &schedule.shift_on(today))
                .await?
            {
                Some(id) => {
                    debug!(schedule_id = %schedule.id, work_log_id = %id, "materialized recurring shift")
                }
                None => debug!(schedule_id = %schedule.id, "recurring shift already materialized"),
            }
        }
        Ok(())
    }
}

fn status_change(id: Uuid, status: ShiftStatus, message: &str) -> StatusChangeResponse {
    StatusChangeResponse {
        work_log_id: id,
        status,
        status_label: status.label().to_string(),
        message: message.to_string(),
    }
}

fn today_entry(detail: &WorkLogDetail) -> TodayShiftResponse {
    let minutes = detail.log.effective_minutes().unwrap_or(0);
    let hourly_wage = detail.hourly_rate.unwrap_or(0);
    TodayShiftResponse {
        work_log_id: detail.log.id,
        status: detail.log.status,
        status_label: detail.log.status.label().to_string(),
        workplace: detail.workplace().to_string(),
        start_time: format_hhmm(detail.log.start_time),
        end_time: format_hhmm(detail.log.end_time),
        work_hours: work_hours(minutes),
        hourly_wage,
        total_wage: expected_income(minutes, hourly_wage),
    }
}
