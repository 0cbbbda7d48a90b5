//! In-memory store for tests. Mirrors the MySQL adapter's semantics closely
//! enough that services and handlers can be exercised without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::bail;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::model::schedule::{RepeatKind, Schedule};
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::{NewWorkLog, ShiftStatus, WorkLog, WorkLogDetail};
use crate::models::SortOrder;
use crate::repository::{
    Deadline, ScheduleRepository, SettlementPageQuery, SettlementRepository, UserRepository,
    WorkLogRepository,
};

#[derive(Debug, Clone)]
struct Posting {
    store_name: String,
    hourly_rate: i64,
}

#[derive(Default)]
struct State {
    logs: Vec<WorkLog>,
    postings: HashMap<Uuid, Posting>,
    settlements: HashMap<(Uuid, Uuid), SettlementStatus>,
    ledger: Vec<(Uuid, i64)>,
    schedules: Vec<Schedule>,
    users: HashMap<Uuid, Option<i64>>,
    failing_updates: HashSet<ShiftStatus>,
    interfere_next_update: Option<ShiftStatus>,
    stale_occurrence_checks: bool,
}

impl State {
    fn has_occurrence(&self, schedule_id: Uuid, work_date: NaiveDate) -> bool {
        self.logs
            .iter()
            .any(|l| l.schedule_id == Some(schedule_id) && l.work_date == work_date)
    }

    fn detail(&self, log: &WorkLog) -> WorkLogDetail {
        let posting = log.posting_id.and_then(|id| self.postings.get(&id));
        let schedule_workplace = log
            .schedule_id
            .and_then(|id| self.schedules.iter().find(|s| s.id == id))
            .and_then(|s| s.workplace.clone());
        let settlement = log
            .posting_id
            .and_then(|id| self.settlements.get(&(log.user_id, id)).copied());
        let recorded_amount = self
            .ledger
            .iter()
            .filter(|(id, _)| *id == log.id)
            .map(|(_, amount)| amount)
            .sum();

        WorkLogDetail {
            log: log.clone(),
            hourly_rate: posting.map(|p| p.hourly_rate),
            store_name: posting.map(|p| p.store_name.clone()),
            schedule_workplace,
            settlement,
            recorded_amount,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, income_goal: Option<i64>) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().users.insert(id, income_goal);
        id
    }

    pub fn add_posting(&self, store_name: &str, hourly_rate: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().postings.insert(
            id,
            Posting {
                store_name: store_name.to_string(),
                hourly_rate,
            },
        );
        id
    }

    /// Creates or overwrites the user's settlement record for a posting.
    pub fn set_settlement(&self, user_id: Uuid, posting_id: Uuid, status: SettlementStatus) {
        self.state
            .lock()
            .unwrap()
            .settlements
            .insert((user_id, posting_id), status);
    }

    pub fn add_shift(
        &self,
        user_id: Uuid,
        posting_id: Option<Uuid>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        status: ShiftStatus,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().logs.push(WorkLog {
            id,
            user_id,
            posting_id,
            schedule_id: None,
            work_date: start.date(),
            start_time: Some(start),
            end_time: Some(end),
            work_minutes: Some((end - start).num_minutes()),
            status,
        });
        id
    }

    pub fn add_income(&self, work_log_id: Uuid, amount: i64) {
        self.state.lock().unwrap().ledger.push((work_log_id, amount));
    }

    pub fn status_of(&self, work_log_id: Uuid) -> Option<ShiftStatus> {
        self.state
            .lock()
            .unwrap()
            .logs
            .iter()
            .find(|l| l.id == work_log_id)
            .map(|l| l.status)
    }

    pub fn settlement_of(&self, user_id: Uuid, posting_id: Uuid) -> Option<SettlementStatus> {
        self.state
            .lock()
            .unwrap()
            .settlements
            .get(&(user_id, posting_id))
            .copied()
    }

    pub fn schedules_of(&self, user_id: Uuid) -> Vec<Schedule> {
        self.state
            .lock()
            .unwrap()
            .schedules
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn logs_for_schedule(&self, schedule_id: Uuid) -> Vec<WorkLog> {
        self.state
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|l| l.schedule_id == Some(schedule_id))
            .cloned()
            .collect()
    }

    /// Makes every bulk update of shifts in `status` fail.
    pub fn fail_updates_from(&self, status: ShiftStatus) {
        self.state.lock().unwrap().failing_updates.insert(status);
    }

    /// Makes occurrence checks miss existing shifts, as a request racing
    /// another one would.
    pub fn stale_occurrence_checks(&self) {
        self.state.lock().unwrap().stale_occurrence_checks = true;
    }

    /// Before the next conditional update, moves the target row to `status`
    /// as if another writer got there first.
    pub fn interfere_next_update(&self, status: ShiftStatus) {
        self.state.lock().unwrap().interfere_next_update = Some(status);
    }
}

fn shift_row(user_id: Uuid, schedule_id: Uuid, shift: &NewWorkLog) -> WorkLog {
    WorkLog {
        id: Uuid::new_v4(),
        user_id,
        posting_id: None,
        schedule_id: Some(schedule_id),
        work_date: shift.work_date,
        start_time: shift.start_time,
        end_time: shift.end_time,
        work_minutes: shift.work_minutes,
        status: ShiftStatus::Scheduled,
    }
}

#[async_trait]
impl WorkLogRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<WorkLog>> {
        let state = self.state.lock().unwrap();
        Ok(state.logs.iter().find(|l| l.id == id).cloned())
    }

    async fn find_detail(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<WorkLogDetail>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .find(|l| l.id == id && l.user_id == user_id)
            .map(|l| state.detail(l)))
    }

    async fn find_details_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<WorkLogDetail>> {
        let state = self.state.lock().unwrap();
        let mut logs: Vec<&WorkLog> = state
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && l.work_date >= from && l.work_date < to)
            .collect();
        logs.sort_by_key(|l| (l.start_time.is_none(), l.start_time, l.id));
        Ok(logs.into_iter().map(|l| state.detail(l)).collect())
    }

    async fn exists_for_schedule_on(
        &self,
        schedule_id: Uuid,
        work_date: NaiveDate,
    ) -> anyhow::Result<bool> {
        let state = self.state.lock().unwrap();
        if state.stale_occurrence_checks {
            return Ok(false);
        }
        Ok(state.has_occurrence(schedule_id, work_date))
    }

    async fn insert_for_schedule(
        &self,
        user_id: Uuid,
        schedule_id: Uuid,
        shift: &NewWorkLog,
    ) -> anyhow::Result<Option<Uuid>> {
        let mut state = self.state.lock().unwrap();
        // unique (schedule, work_date)
        if state.has_occurrence(schedule_id, shift.work_date) {
            return Ok(None);
        }
        let row = shift_row(user_id, schedule_id, shift);
        let id = row.id;
        state.logs.push(row);
        Ok(Some(id))
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> anyhow::Result<bool> {
        let mut state = self.state.lock().unwrap();
        let interference = state.interfere_next_update.take();
        let Some(log) = state.logs.iter_mut().find(|l| l.id == id) else {
            return Ok(false);
        };
        if let Some(status) = interference {
            log.status = status;
        }
        if log.status != expected {
            return Ok(false);
        }
        log.status = next;
        Ok(true)
    }

    async fn update_due(
        &self,
        expected: ShiftStatus,
        next: ShiftStatus,
        deadline: Deadline,
        now: NaiveDateTime,
    ) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(&expected) {
            bail!("connection lost while updating {expected} shifts");
        }
        let mut affected = 0;
        for log in state.logs.iter_mut().filter(|l| l.status == expected) {
            let at = match deadline {
                Deadline::Start => log.start_time,
                Deadline::End => log.end_time,
            };
            if at.is_some_and(|at| at <= now) {
                log.status = next;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn update_paid(&self, expected: ShiftStatus, next: ShiftStatus) -> anyhow::Result<u64> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(&expected) {
            bail!("connection lost while updating {expected} shifts");
        }
        let State {
            logs, settlements, ..
        } = &mut *state;
        let mut affected = 0;
        for log in logs.iter_mut().filter(|l| l.status == expected) {
            let paid = log.posting_id.is_some_and(|posting| {
                settlements.get(&(log.user_id, posting)) == Some(&SettlementStatus::Paid)
            });
            if paid {
                log.status = next;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn settlement_page(
        &self,
        query: &SettlementPageQuery,
    ) -> anyhow::Result<Vec<WorkLogDetail>> {
        let state = self.state.lock().unwrap();
        let mut details: Vec<WorkLogDetail> = state
            .logs
            .iter()
            .filter(|l| l.user_id == query.user_id)
            .map(|l| state.detail(l))
            .filter(|d| match query.status {
                Some(status) => d.settlement.unwrap_or_default() == status,
                None => true,
            })
            .filter(|d| match (query.cursor, query.order) {
                (None, _) => true,
                (Some(cursor), SortOrder::Latest) => (d.log.work_date, d.log.id) < cursor,
                (Some(cursor), SortOrder::Oldest) => (d.log.work_date, d.log.id) > cursor,
            })
            .collect();

        details.sort_by_key(|d| (d.log.work_date, d.log.id));
        if query.order == SortOrder::Latest {
            details.reverse();
        }
        details.truncate(query.limit as usize);
        Ok(details)
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn create(
        &self,
        schedule: &Schedule,
        first_shift: Option<&NewWorkLog>,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.schedules.push(schedule.clone());
        if let Some(shift) = first_shift {
            state
                .logs
                .push(shift_row(schedule.user_id, schedule.id, shift));
        }
        Ok(())
    }

    async fn find_by_id_and_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Schedule>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .schedules
            .iter()
            .find(|s| s.id == id && s.user_id == user_id)
            .cloned())
    }

    async fn list_recurring(&self, user_id: Uuid) -> anyhow::Result<Vec<Schedule>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .schedules
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| {
                matches!(
                    s.repeat_type,
                    Some(RepeatKind::Daily | RepeatKind::Weekly | RepeatKind::Biweekly)
                )
            })
            .cloned()
            .collect())
    }

    async fn update(&self, schedule: &Schedule) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state
            .schedules
            .iter_mut()
            .find(|s| s.id == schedule.id && s.user_id == schedule.user_id)
        {
            *stored = schedule.clone();
        }
        Ok(())
    }

    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.schedules.len();
        state.schedules.retain(|s| !(s.id == id && s.user_id == user_id));
        if state.schedules.len() == before {
            return Ok(false);
        }
        state.logs.retain(|l| l.schedule_id != Some(id));
        Ok(true)
    }
}

#[async_trait]
impl SettlementRepository for MemoryStore {
    async fn set_status(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        status: SettlementStatus,
        settle: Option<(ShiftStatus, ShiftStatus)>,
    ) -> anyhow::Result<Option<u64>> {
        let mut state = self.state.lock().unwrap();
        if !state.settlements.contains_key(&(user_id, posting_id)) {
            return Ok(None);
        }
        // a failing shift update rolls the whole write back
        if let Some((from, _)) = settle {
            if state.failing_updates.contains(&from) {
                bail!("connection lost while updating {from} shifts");
            }
        }

        state.settlements.insert((user_id, posting_id), status);
        let mut moved = 0;
        if let Some((from, to)) = settle {
            for log in state.logs.iter_mut() {
                if log.user_id == user_id && log.posting_id == Some(posting_id) && log.status == from
                {
                    log.status = to;
                    moved += 1;
                }
            }
        }
        Ok(Some(moved))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn income_goal(&self, user_id: Uuid) -> anyhow::Result<Option<Option<i64>>> {
        Ok(self.state.lock().unwrap().users.get(&user_id).copied())
    }

    async fn set_income_goal(&self, user_id: Uuid, goal: Option<i64>) -> anyhow::Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.users.get_mut(&user_id) {
            Some(stored) => {
                *stored = goal;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
