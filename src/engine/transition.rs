//! Shift state machine.
//!
//! Pure decision function: given the current status, an action and the
//! shift's time window, either return the next status or refuse.

use chrono::NaiveDateTime;

use crate::error::{AppError, AppResult};
use crate::model::work_log::{ShiftAction, ShiftStatus};

/// Scheduled start/end of a shift, when known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// The single legal `(from, to)` edge for each action.
pub const fn edge(action: ShiftAction) -> (ShiftStatus, ShiftStatus) {
    match action {
        ShiftAction::CheckIn => (ShiftStatus::Scheduled, ShiftStatus::Working),
        ShiftAction::CheckOut => (ShiftStatus::Working, ShiftStatus::Done),
        ShiftAction::AutoCheckOut => (ShiftStatus::Working, ShiftStatus::Done),
        ShiftAction::MarkAbsent => (ShiftStatus::Scheduled, ShiftStatus::Absent),
        ShiftAction::Settle => (ShiftStatus::Done, ShiftStatus::Settled),
    }
}

/// Time guard for sweep-driven actions; owner actions have none.
fn deadline_passed(action: ShiftAction, now: NaiveDateTime, window: ShiftWindow) -> bool {
    match action {
        ShiftAction::AutoCheckOut => window.end.is_some_and(|end| now >= end),
        ShiftAction::MarkAbsent => window.start.is_some_and(|start| now >= start),
        ShiftAction::CheckIn | ShiftAction::CheckOut | ShiftAction::Settle => true,
    }
}

pub fn next_status(
    current: ShiftStatus,
    action: ShiftAction,
    now: NaiveDateTime,
    window: ShiftWindow,
) -> AppResult<ShiftStatus> {
    let (from, to) = edge(action);
    if current != from || !deadline_passed(action, now, window) {
        return Err(AppError::InvalidStateTransition {
            from: current,
            action,
        });
    }
    Ok(to)
}
