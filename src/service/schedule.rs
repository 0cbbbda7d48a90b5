use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::engine::income::expected_income;
use crate::error::{AppError, AppResult};
use crate::model::schedule::{Schedule, WorkTime, validate_recurrence};
use crate::models::{CreateSchedule, ScheduleResponse, UpdateSchedule};
use crate::repository::{ScheduleRepository, WorkLogRepository};

pub struct ScheduleService {
    schedules: Arc<dyn ScheduleRepository>,
    work_logs: Arc<dyn WorkLogRepository>,
}

fn parse_work_time(value: Option<&str>) -> AppResult<Option<WorkTime>> {
    value.map(str::parse::<WorkTime>).transpose()
}

fn check_wage(wage: Option<i64>) -> AppResult<Option<i64>> {
    match wage {
        Some(w) if w < 0 => Err(AppError::validation("hourly_wage must not be negative")),
        other => Ok(other),
    }
}

fn to_response(schedule: &Schedule) -> ScheduleResponse {
    let estimated_wage = match (schedule.work_time, schedule.hourly_wage) {
        (Some(work_time), Some(wage)) => expected_income(work_time.minutes(), wage),
        _ => 0,
    };
    ScheduleResponse {
        schedule_id: schedule.id,
        workplace: schedule.workplace.clone().unwrap_or_default(),
        work_date: schedule.work_date,
        work_time: schedule
            .work_time
            .map(|t| t.to_string())
            .unwrap_or_default(),
        hourly_wage: schedule.hourly_wage.unwrap_or(0),
        estimated_wage,
        memo: schedule.memo.clone().unwrap_or_default(),
    }
}

impl ScheduleService {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        work_logs: Arc<dyn WorkLogRepository>,
    ) -> Self {
        Self {
            schedules,
            work_logs,
        }
    }

    /// Stores a manual schedule. A dated schedule gets its shift right away
    /// so it shows up in the today list.
    #[instrument(name = "schedule_create", skip(self, body))]
    pub async fn create_manual(
        &self,
        user_id: Uuid,
        body: CreateSchedule,
    ) -> AppResult<ScheduleResponse> {
        let repeat_days = validate_recurrence(body.repeat_type, body.repeat_days.as_deref())?;
        let schedule = Schedule {
            id: Uuid::new_v4(),
            user_id,
            workplace: body.workplace,
            work_date: body.work_date,
            work_time: parse_work_time(body.work_time.as_deref())?,
            day_of_week: body.day_of_week,
            repeat_type: body.repeat_type,
            repeat_days,
            hourly_wage: check_wage(body.hourly_wage)?,
            memo: body.memo,
        };

        let first_shift = schedule.work_date.map(|date| schedule.shift_on(date));
        self.schedules
            .create(&schedule, first_shift.as_ref())
            .await?;

        info!(schedule_id = %schedule.id, with_shift = first_shift.is_some(), "schedule created");
        Ok(to_response(&schedule))
    }

    /// Copies date, time range, rate and store name from one of the caller's
    /// shifts into a new schedule.
    #[instrument(name = "schedule_create_from_work_log", skip(self))]
    pub async fn create_from_work_log(
        &self,
        user_id: Uuid,
        work_log_id: Uuid,
    ) -> AppResult<ScheduleResponse> {
        let detail = self
            .work_logs
            .find_detail(user_id, work_log_id)
            .await?
            .ok_or_else(|| AppError::not_found("work log"))?;

        let schedule = Schedule {
            id: Uuid::new_v4(),
            user_id,
            workplace: detail.store_name.clone(),
            work_date: Some(detail.log.work_date),
            work_time: WorkTime::from_log(detail.log.start_time, detail.log.end_time),
            day_of_week: None,
            repeat_type: None,
            repeat_days: None,
            hourly_wage: detail.hourly_rate,
            memo: None,
        };
        self.schedules.create(&schedule, None).await?;

        info!(schedule_id = %schedule.id, "schedule copied from work log");
        Ok(to_response(&schedule))
    }

    #[instrument(name = "schedule_update", skip(self, body))]
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        body: UpdateSchedule,
    ) -> AppResult<ScheduleResponse> {
        if body.is_empty() {
            return Err(AppError::validation("no fields to update"));
        }

        let mut schedule = self
            .schedules
            .find_by_id_and_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("schedule"))?;

        if body.touches_recurrence() {
            let kind = body.repeat_type.or(schedule.repeat_type);
            let days = match body.repeat_days.as_deref() {
                Some(days) => Some(days.to_string()),
                // keep the stored mask only while the kind still needs one
                None if kind.is_some_and(|k| k.needs_day_mask()) => schedule
                    .repeat_days
                    .as_ref()
                    .map(|m| m.as_str().to_string()),
                None => None,
            };
            schedule.repeat_days = validate_recurrence(kind, days.as_deref())?;
            schedule.repeat_type = kind;
        }

        if let Some(work_time) = parse_work_time(body.work_time.as_deref())? {
            schedule.work_time = Some(work_time);
        }
        if let Some(wage) = check_wage(body.hourly_wage)? {
            schedule.hourly_wage = Some(wage);
        }
        if body.workplace.is_some() {
            schedule.workplace = body.workplace;
        }
        if body.work_date.is_some() {
            schedule.work_date = body.work_date;
        }
        if body.day_of_week.is_some() {
            schedule.day_of_week = body.day_of_week;
        }
        if body.memo.is_some() {
            schedule.memo = body.memo;
        }

        self.schedules.update(&schedule).await?;
        info!("schedule updated");
        Ok(to_response(&schedule))
    }

    #[instrument(name = "schedule_delete", skip(self))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.schedules.delete_by_id_and_user(id, user_id).await? {
            return Err(AppError::not_found("schedule"));
        }
        info!("schedule deleted");
        Ok(())
    }
}
