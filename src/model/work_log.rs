use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::settlement::SettlementStatus;

/// Lifecycle of one shift.
///
/// `scheduled -> working -> done -> settled`, with `absent` as a terminal
/// branch out of `scheduled`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShiftStatus {
    Scheduled,
    Working,
    Done,
    Settled,
    Absent,
}

impl ShiftStatus {
    /// Human label shown next to the status literal.
    pub fn label(&self) -> &'static str {
        match self {
            ShiftStatus::Scheduled => "예정",
            ShiftStatus::Working => "근무 중",
            ShiftStatus::Done => "근무 완료",
            ShiftStatus::Settled => "정산 완료",
            ShiftStatus::Absent => "결근",
        }
    }
}

/// Everything that can move a shift to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ShiftAction {
    /// Owner starts working.
    CheckIn,
    /// Owner finishes working.
    CheckOut,
    /// Sweep: the scheduled end time has passed while working.
    AutoCheckOut,
    /// Sweep: the scheduled start time has passed without a check-in.
    MarkAbsent,
    /// Payment for the shift's posting was confirmed.
    Settle,
}

/// One concrete occurrence of work (a row of `user_work_log`).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub posting_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub work_minutes: Option<i64>,
    pub status: ShiftStatus,
}

impl WorkLog {
    /// Stored minutes when present, otherwise `max(0, end - start)`.
    /// `None` when neither source is available.
    pub fn effective_minutes(&self) -> Option<i64> {
        if let Some(minutes) = self.work_minutes {
            return Some(minutes.max(0));
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_minutes().max(0)),
            _ => None,
        }
    }
}

/// A shift joined with the read-only data the income screens need.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLogDetail {
    pub log: WorkLog,
    /// Hourly rate of the linked posting, if any.
    pub hourly_rate: Option<i64>,
    /// Store display name of the linked posting, if any.
    pub store_name: Option<String>,
    /// Workplace typed on the linked schedule, if any.
    pub schedule_workplace: Option<String>,
    /// Caller's settlement status for the linked posting, if a record exists.
    pub settlement: Option<SettlementStatus>,
    /// Sum of income-ledger amounts recorded against this shift.
    pub recorded_amount: i64,
}

impl WorkLogDetail {
    pub fn workplace(&self) -> &str {
        self.store_name
            .as_deref()
            .or(self.schedule_workplace.as_deref())
            .unwrap_or("")
    }
}

/// Data for a shift materialized from a schedule occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkLog {
    pub work_date: NaiveDate,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub work_minutes: Option<i64>,
}

impl NewWorkLog {
    /// A shift with a date but no time range yet.
    pub fn untimed(work_date: NaiveDate) -> Self {
        Self {
            work_date,
            start_time: None,
            end_time: None,
            work_minutes: None,
        }
    }
}
