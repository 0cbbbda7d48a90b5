use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::work_log::NewWorkLog;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RepeatKind {
    None,
    Daily,
    Weekly,
    Biweekly,
}

impl RepeatKind {
    pub fn needs_day_mask(&self) -> bool {
        matches!(self, RepeatKind::Weekly | RepeatKind::Biweekly)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

/// Seven `0`/`1` characters, Monday first, with at least one day set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMask(String);

impl DayMask {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn includes(&self, day: Weekday) -> bool {
        self.0.as_bytes()[day.num_days_from_monday() as usize] == b'1'
    }
}

impl FromStr for DayMask {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 7 || !s.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(AppError::validation(
                "repeat_days must be a 7-digit bit mask such as 1010100",
            ));
        }
        if !s.contains('1') {
            return Err(AppError::validation(
                "repeat_days must include at least one day",
            ));
        }
        Ok(DayMask(s.to_string()))
    }
}

/// Checks that a day mask is present iff the repeat kind needs one.
pub fn validate_recurrence(
    kind: Option<RepeatKind>,
    days: Option<&str>,
) -> AppResult<Option<DayMask>> {
    let Some(kind) = kind else {
        if days.is_some() {
            return Err(AppError::validation(
                "repeat_days cannot be sent without repeat_type",
            ));
        }
        return Ok(None);
    };

    if !kind.needs_day_mask() {
        if days.is_some() {
            return Err(AppError::validation(format!(
                "repeat_days is not allowed when repeat_type is {kind}"
            )));
        }
        return Ok(None);
    }

    match days {
        Some(days) => days.parse().map(Some),
        None => Err(AppError::validation(format!(
            "repeat_days is required when repeat_type is {kind}"
        ))),
    }
}

/// A wall-clock time range, `HH:MM-HH:MM`. End before start means the
/// shift runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkTime {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

pub fn parse_hhmm(value: &str) -> AppResult<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(AppError::validation(format!(
            "'{value}' is not a valid HH:MM time"
        )));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::validation(format!("'{value}' is not a valid HH:MM time")))
}

pub fn format_hhmm(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

impl WorkTime {
    pub fn from_log(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<Self> {
        Some(WorkTime {
            start: start?.time(),
            end: end?.time(),
        })
    }

    /// Pins the range to a date, rolling the end to the next day when it is
    /// not after the start.
    pub fn materialize(&self, work_date: NaiveDate) -> NewWorkLog {
        let start_time = work_date.and_time(self.start);
        let mut end_time = work_date.and_time(self.end);
        if end_time <= start_time {
            end_time += Duration::days(1);
        }
        NewWorkLog {
            work_date,
            start_time: Some(start_time),
            end_time: Some(end_time),
            work_minutes: Some((end_time - start_time).num_minutes()),
        }
    }

    pub fn minutes(&self) -> i64 {
        let minutes = (self.end - self.start).num_minutes();
        if minutes <= 0 { minutes + 24 * 60 } else { minutes }
    }
}

impl FromStr for WorkTime {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            AppError::validation(format!("work_time '{s}' must look like HH:MM-HH:MM"))
        })?;
        Ok(WorkTime {
            start: parse_hhmm(start.trim())?,
            end: parse_hhmm(end.trim())?,
        })
    }
}

impl fmt::Display for WorkTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// A user-defined template that generates shifts (`user_alba_schedule`).
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workplace: Option<String>,
    pub work_date: Option<NaiveDate>,
    pub work_time: Option<WorkTime>,
    pub day_of_week: Option<DayOfWeek>,
    pub repeat_type: Option<RepeatKind>,
    pub repeat_days: Option<DayMask>,
    pub hourly_wage: Option<i64>,
    pub memo: Option<String>,
}

impl Schedule {
    /// The shift this schedule produces on `date`.
    pub fn shift_on(&self, date: NaiveDate) -> NewWorkLog {
        match self.work_time {
            Some(work_time) => work_time.materialize(date),
            None => NewWorkLog::untimed(date),
        }
    }

    /// Whether this schedule has an occurrence on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if self.work_date == Some(date) {
            return true;
        }
        match (self.repeat_type, &self.repeat_days) {
            (Some(RepeatKind::Daily), _) => true,
            (Some(RepeatKind::Weekly), Some(mask)) => mask.includes(date.weekday()),
            (Some(RepeatKind::Biweekly), Some(mask)) => {
                let Some(anchor) = self.work_date else {
                    return mask.includes(date.weekday());
                };
                let weeks = (date.week(Weekday::Mon).first_day()
                    - anchor.week(Weekday::Mon).first_day())
                .num_weeks();
                weeks >= 0 && weeks % 2 == 0 && mask.includes(date.weekday())
            }
            _ => false,
        }
    }
}
