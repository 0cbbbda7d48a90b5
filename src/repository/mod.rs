//! Persistence seams.
//!
//! Services only see these traits. `MySqlStore` backs them in production and
//! the in-memory store backs them in tests.

pub mod mysql;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::model::schedule::Schedule;
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::{NewWorkLog, ShiftStatus, WorkLog, WorkLogDetail};
use crate::models::SortOrder;

/// Which scheduled timestamp a sweep predicate compares against `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPageQuery {
    pub user_id: Uuid,
    /// `None` matches every status, including shifts with no settlement record.
    pub status: Option<SettlementStatus>,
    pub order: SortOrder,
    /// `(work_date, id)` of the last row of the previous page.
    pub cursor: Option<(NaiveDate, Uuid)>,
    pub limit: u32,
}

#[async_trait]
pub trait WorkLogRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<WorkLog>>;

    async fn find_detail(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<WorkLogDetail>>;

    /// Shifts of `user_id` with `from <= work_date < to`, ordered by start time.
    async fn find_details_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<WorkLogDetail>>;

    async fn exists_for_schedule_on(
        &self,
        schedule_id: Uuid,
        work_date: NaiveDate,
    ) -> anyhow::Result<bool>;

    /// Inserts the schedule's shift for one date. `None` when that occurrence
    /// already has a shift.
    async fn insert_for_schedule(
        &self,
        user_id: Uuid,
        schedule_id: Uuid,
        shift: &NewWorkLog,
    ) -> anyhow::Result<Option<Uuid>>;

    /// Moves one shift to `next` only if it is still `expected`.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> anyhow::Result<bool>;

    /// Moves every shift in `expected` whose `deadline` timestamp is at or
    /// before `now` to `next`, in one statement.
    async fn update_due(
        &self,
        expected: ShiftStatus,
        next: ShiftStatus,
        deadline: Deadline,
        now: NaiveDateTime,
    ) -> anyhow::Result<u64>;

    /// Moves every shift in `expected` whose posting the owner has marked
    /// `paid` to `next`.
    async fn update_paid(&self, expected: ShiftStatus, next: ShiftStatus) -> anyhow::Result<u64>;

    async fn settlement_page(&self, query: &SettlementPageQuery)
    -> anyhow::Result<Vec<WorkLogDetail>>;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Stores the schedule and, when given, its first shift in one transaction.
    async fn create(&self, schedule: &Schedule, first_shift: Option<&NewWorkLog>)
    -> anyhow::Result<()>;

    async fn find_by_id_and_user(&self, id: Uuid, user_id: Uuid)
    -> anyhow::Result<Option<Schedule>>;

    /// Schedules with a daily, weekly or biweekly repeat.
    async fn list_recurring(&self, user_id: Uuid) -> anyhow::Result<Vec<Schedule>>;

    async fn update(&self, schedule: &Schedule) -> anyhow::Result<()>;

    /// Deletes the schedule and every shift it generated.
    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Stores the status and, when `settle` is given, moves the posting's
    /// shifts along that edge in the same transaction. Returns the number of
    /// moved shifts, or `None` when the user has no record for the posting.
    async fn set_status(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        status: SettlementStatus,
        settle: Option<(ShiftStatus, ShiftStatus)>,
    ) -> anyhow::Result<Option<u64>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `None` when the user does not exist, `Some(None)` when no goal is set.
    async fn income_goal(&self, user_id: Uuid) -> anyhow::Result<Option<Option<i64>>>;

    async fn set_income_goal(&self, user_id: Uuid, goal: Option<i64>) -> anyhow::Result<bool>;
}
