//! Background sweep that reconciles shift status with the wall clock.
//!
//! Each tick closes `working` shifts whose end has passed, settles `done`
//! shifts of postings already marked paid, then marks `scheduled` shifts
//! whose start has passed as `absent`. Every pass is a single conditional
//! bulk update, so a repeated tick with no time change is a no-op. A failing
//! pass is logged and never stops the other passes or the timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::engine::transition::edge;
use crate::model::work_log::ShiftAction;
use crate::repository::{Deadline, WorkLogRepository};

/// Rows affected by each pass of one tick; `None` when the pass failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub auto_checked_out: Option<u64>,
    pub settled: Option<u64>,
    pub marked_absent: Option<u64>,
}

/// What makes a shift eligible for a pass.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Due(Deadline),
    PaidPosting,
}

pub struct ShiftSweeper {
    work_logs: Arc<dyn WorkLogRepository>,
    clock: Arc<dyn Clock>,
}

impl ShiftSweeper {
    pub fn new(work_logs: Arc<dyn WorkLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { work_logs, clock }
    }

    pub async fn tick(&self) -> SweepReport {
        let now = self.clock.now();
        // expiring `working` shifts go first so they can settle in this tick
        let auto_checked_out = self
            .pass(ShiftAction::AutoCheckOut, Trigger::Due(Deadline::End), now)
            .await;
        let settled = self
            .pass(ShiftAction::Settle, Trigger::PaidPosting, now)
            .await;
        let marked_absent = self
            .pass(ShiftAction::MarkAbsent, Trigger::Due(Deadline::Start), now)
            .await;
        SweepReport {
            auto_checked_out,
            settled,
            marked_absent,
        }
    }

    async fn pass(&self, action: ShiftAction, trigger: Trigger, now: NaiveDateTime) -> Option<u64> {
        let (from, to) = edge(action);
        let result = match trigger {
            Trigger::Due(deadline) => self.work_logs.update_due(from, to, deadline, now).await,
            Trigger::PaidPosting => self.work_logs.update_paid(from, to).await,
        };

        match result {
            Ok(0) => {
                debug!(%action, "sweep pass found nothing due");
                Some(0)
            }
            Ok(affected) => {
                info!(%action, affected, "sweep pass applied");
                Some(affected)
            }
            Err(e) => {
                error!(%action, error = %e, "sweep pass failed");
                None
            }
        }
    }
}

/// Running sweep task.
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stops the timer and waits for an in-flight tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "shift sweep task ended abnormally");
        }
    }
}

/// Runs `sweeper.tick()` every `period` until the handle is shut down.
/// The first tick fires immediately, which catches up anything missed while
/// the process was down.
pub fn spawn_sweeper(sweeper: ShiftSweeper, period: Duration) -> SweepHandle {
    let (shutdown, mut stop) = watch::channel(false);

    let task = actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "shift sweep started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweeper.tick().await;
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        info!("shift sweep stopped");
    });

    SweepHandle { shutdown, task }
}
