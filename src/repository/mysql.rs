use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlExecutor, MySqlPool};
use tracing::debug;
use uuid::Uuid;

use crate::model::schedule::{DayMask, DayOfWeek, RepeatKind, Schedule, WorkTime};
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::{NewWorkLog, ShiftStatus, WorkLog, WorkLogDetail};
use crate::models::SortOrder;
use crate::repository::{
    Deadline, ScheduleRepository, SettlementPageQuery, SettlementRepository, UserRepository,
    WorkLogRepository,
};

/// Shift columns plus the posting, store, schedule, settlement and ledger
/// data the read screens need.
const DETAIL_SELECT: &str = r#"
    SELECT
        w.user_work_log_id, w.user_id, w.alba_id, w.user_alba_schedule_id,
        w.work_date, w.start_time, w.end_time, w.work_minutes, w.status,
        p.hourly_rate,
        s.store_name,
        sch.workplace AS schedule_workplace,
        ua.settlement_status,
        CAST(COALESCE(
            (SELECT SUM(i.amount) FROM income_log i
             WHERE i.user_work_log_id = w.user_work_log_id), 0
        ) AS SIGNED) AS recorded_amount
    FROM user_work_log w
    LEFT JOIN alba_posting p ON p.alba_id = w.alba_id
    LEFT JOIN store s ON s.store_id = p.store_id
    LEFT JOIN user_alba_schedule sch ON sch.user_alba_schedule_id = w.user_alba_schedule_id
    LEFT JOIN user_alba ua ON ua.alba_id = w.alba_id AND ua.user_id = w.user_id
"#;

const SCHEDULE_COLUMNS: &str = r#"
    user_alba_schedule_id, user_id, workplace, work_date, work_time,
    day_of_week, repeat_type, repeat_days, hourly_wage, memo
"#;

#[derive(Debug, FromRow)]
struct WorkLogRow {
    user_work_log_id: Uuid,
    user_id: Uuid,
    alba_id: Option<Uuid>,
    user_alba_schedule_id: Option<Uuid>,
    work_date: NaiveDate,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    work_minutes: Option<i64>,
    status: String,
}

impl TryFrom<WorkLogRow> for WorkLog {
    type Error = anyhow::Error;

    fn try_from(row: WorkLogRow) -> anyhow::Result<Self> {
        let status = row
            .status
            .parse::<ShiftStatus>()
            .with_context(|| format!("unknown shift status {:?}", row.status))?;
        Ok(WorkLog {
            id: row.user_work_log_id,
            user_id: row.user_id,
            posting_id: row.alba_id,
            schedule_id: row.user_alba_schedule_id,
            work_date: row.work_date,
            start_time: row.start_time,
            end_time: row.end_time,
            work_minutes: row.work_minutes,
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct WorkLogDetailRow {
    #[sqlx(flatten)]
    log: WorkLogRow,
    hourly_rate: Option<i64>,
    store_name: Option<String>,
    schedule_workplace: Option<String>,
    settlement_status: Option<String>,
    recorded_amount: i64,
}

impl TryFrom<WorkLogDetailRow> for WorkLogDetail {
    type Error = anyhow::Error;

    fn try_from(row: WorkLogDetailRow) -> anyhow::Result<Self> {
        let settlement = row
            .settlement_status
            .as_deref()
            .map(str::parse::<SettlementStatus>)
            .transpose()
            .with_context(|| format!("unknown settlement status {:?}", row.settlement_status))?;
        Ok(WorkLogDetail {
            log: row.log.try_into()?,
            hourly_rate: row.hourly_rate,
            store_name: row.store_name,
            schedule_workplace: row.schedule_workplace,
            settlement,
            recorded_amount: row.recorded_amount,
        })
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRow {
    user_alba_schedule_id: Uuid,
    user_id: Uuid,
    workplace: Option<String>,
    work_date: Option<NaiveDate>,
    work_time: Option<String>,
    day_of_week: Option<String>,
    repeat_type: Option<String>,
    repeat_days: Option<String>,
    hourly_wage: Option<i64>,
    memo: Option<String>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = anyhow::Error;

    fn try_from(row: ScheduleRow) -> anyhow::Result<Self> {
        let work_time = row
            .work_time
            .as_deref()
            .map(str::parse::<WorkTime>)
            .transpose()
            .map_err(|e| anyhow!("stored work_time {:?}: {e}", row.work_time))?;
        let day_of_week = row
            .day_of_week
            .as_deref()
            .map(str::parse::<DayOfWeek>)
            .transpose()
            .with_context(|| format!("unknown day_of_week {:?}", row.day_of_week))?;
        let repeat_type = row
            .repeat_type
            .as_deref()
            .map(str::parse::<RepeatKind>)
            .transpose()
            .with_context(|| format!("unknown repeat_type {:?}", row.repeat_type))?;
        let repeat_days = row
            .repeat_days
            .as_deref()
            .map(str::parse::<DayMask>)
            .transpose()
            .map_err(|e| anyhow!("stored repeat_days {:?}: {e}", row.repeat_days))?;

        Ok(Schedule {
            id: row.user_alba_schedule_id,
            user_id: row.user_id,
            workplace: row.workplace,
            work_date: row.work_date,
            work_time,
            day_of_week,
            repeat_type,
            repeat_days,
            hourly_wage: row.hourly_wage,
            memo: row.memo,
        })
    }
}

fn into_details(rows: Vec<WorkLogDetailRow>) -> anyhow::Result<Vec<WorkLogDetail>> {
    rows.into_iter().map(WorkLogDetail::try_from).collect()
}

async fn insert_shift(
    executor: impl MySqlExecutor<'_>,
    user_id: Uuid,
    schedule_id: Uuid,
    shift: &NewWorkLog,
) -> sqlx::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO user_work_log
            (user_work_log_id, user_id, user_alba_schedule_id,
             work_date, start_time, end_time, work_minutes, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(schedule_id)
    .bind(shift.work_date)
    .bind(shift.start_time)
    .bind(shift.end_time)
    .bind(shift.work_minutes)
    .bind(ShiftStatus::Scheduled.to_string())
    .execute(executor)
    .await?;
    Ok(id)
}

/// MySQL error 1062, raised by `uq_work_log_schedule_date` when a schedule
/// occurrence already has its shift.
fn is_duplicate_key(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// sqlx-backed implementation of every repository trait.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkLogRepository for MySqlStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<WorkLog>> {
        let row = sqlx::query_as::<_, WorkLogRow>(
            r#"
            SELECT user_work_log_id, user_id, alba_id, user_alba_schedule_id,
                   work_date, start_time, end_time, work_minutes, status
            FROM user_work_log
            WHERE user_work_log_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("select user_work_log")?;

        row.map(WorkLog::try_from).transpose()
    }

    async fn find_detail(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<WorkLogDetail>> {
        let sql = format!("{DETAIL_SELECT} WHERE w.user_work_log_id = ? AND w.user_id = ?");
        let row = sqlx::query_as::<_, WorkLogDetailRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("select work log detail")?;

        row.map(WorkLogDetail::try_from).transpose()
    }

    async fn find_details_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<WorkLogDetail>> {
        let sql = format!(
            "{DETAIL_SELECT}
             WHERE w.user_id = ? AND w.work_date >= ? AND w.work_date < ?
             ORDER BY w.start_time IS NULL, w.start_time, w.user_work_log_id"
        );
        let rows = sqlx::query_as::<_, WorkLogDetailRow>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .context("select work logs in range")?;

        into_details(rows)
    }

    async fn exists_for_schedule_on(
        &self,
        schedule_id: Uuid,
        work_date: NaiveDate,
    ) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_work_log
                WHERE user_alba_schedule_id = ? AND work_date = ?
            )
            "#,
        )
        .bind(schedule_id)
        .bind(work_date)
        .fetch_one(&self.pool)
        .await
        .context("check schedule occurrence")?;

        Ok(exists != 0)
    }

    async fn insert_for_schedule(
        &self,
        user_id: Uuid,
        schedule_id: Uuid,
        shift: &NewWorkLog,
    ) -> anyhow::Result<Option<Uuid>> {
        match insert_shift(&self.pool, user_id, schedule_id, shift).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if is_duplicate_key(&e) => {
                debug!(%schedule_id, work_date = %shift.work_date, "occurrence already materialized");
                Ok(None)
            }
            Err(e) => Err(e).context("insert user_work_log"),
        }
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: ShiftStatus,
        next: ShiftStatus,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_work_log
            SET status = ?, updated_at = NOW()
            WHERE user_work_log_id = ? AND status = ?
            "#,
        )
        .bind(next.to_string())
        .bind(id)
        .bind(expected.to_string())
        .execute(&self.pool)
        .await
        .context("conditional status update")?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_due(
        &self,
        expected: ShiftStatus,
        next: ShiftStatus,
        deadline: Deadline,
        now: NaiveDateTime,
    ) -> anyhow::Result<u64> {
        let column = match deadline {
            Deadline::Start => "start_time",
            Deadline::End => "end_time",
        };
        let sql = format!(
            "UPDATE user_work_log SET status = ?, updated_at = NOW()
             WHERE status = ? AND {column} IS NOT NULL AND {column} <= ?"
        );
        let result = sqlx::query(&sql)
            .bind(next.to_string())
            .bind(expected.to_string())
            .bind(now)
            .execute(&self.pool)
            .await
            .with_context(|| format!("due {expected} -> {next} update"))?;

        Ok(result.rows_affected())
    }

    async fn update_paid(&self, expected: ShiftStatus, next: ShiftStatus) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_work_log w
            JOIN user_alba ua ON ua.user_id = w.user_id AND ua.alba_id = w.alba_id
            SET w.status = ?, w.updated_at = NOW()
            WHERE w.status = ? AND ua.settlement_status = ?
            "#,
        )
        .bind(next.to_string())
        .bind(expected.to_string())
        .bind(SettlementStatus::Paid.to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("paid {expected} -> {next} update"))?;

        Ok(result.rows_affected())
    }

    async fn settlement_page(
        &self,
        query: &SettlementPageQuery,
    ) -> anyhow::Result<Vec<WorkLogDetail>> {
        let mut sql = format!("{DETAIL_SELECT} WHERE w.user_id = ?");
        if query.status.is_some() {
            sql.push_str(" AND COALESCE(ua.settlement_status, 'waiting') = ?");
        }
        let (cmp, dir) = match query.order {
            SortOrder::Latest => ("<", "DESC"),
            SortOrder::Oldest => (">", "ASC"),
        };
        if query.cursor.is_some() {
            sql.push_str(&format!(
                " AND (w.work_date {cmp} ? OR (w.work_date = ? AND w.user_work_log_id {cmp} ?))"
            ));
        }
        sql.push_str(&format!(
            " ORDER BY w.work_date {dir}, w.user_work_log_id {dir} LIMIT ?"
        ));

        let mut q = sqlx::query_as::<_, WorkLogDetailRow>(&sql).bind(query.user_id);
        if let Some(status) = query.status {
            q = q.bind(status.to_string());
        }
        if let Some((date, id)) = query.cursor {
            q = q.bind(date).bind(date).bind(id);
        }
        let rows = q
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await
            .context("select settlement page")?;

        into_details(rows)
    }
}

#[async_trait]
impl ScheduleRepository for MySqlStore {
    async fn create(
        &self,
        schedule: &Schedule,
        first_shift: Option<&NewWorkLog>,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin schedule insert")?;

        sqlx::query(&format!(
            "INSERT INTO user_alba_schedule ({SCHEDULE_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(schedule.id)
        .bind(schedule.user_id)
        .bind(schedule.workplace.as_deref())
        .bind(schedule.work_date)
        .bind(schedule.work_time.map(|t| t.to_string()))
        .bind(schedule.day_of_week.map(|d| d.to_string()))
        .bind(schedule.repeat_type.map(|r| r.to_string()))
        .bind(schedule.repeat_days.as_ref().map(DayMask::as_str))
        .bind(schedule.hourly_wage)
        .bind(schedule.memo.as_deref())
        .execute(&mut *tx)
        .await
        .context("insert user_alba_schedule")?;

        if let Some(shift) = first_shift {
            insert_shift(&mut *tx, schedule.user_id, schedule.id, shift)
                .await
                .context("insert first user_work_log")?;
        }

        tx.commit().await.context("commit schedule insert")?;
        Ok(())
    }

    async fn find_by_id_and_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM user_alba_schedule
             WHERE user_alba_schedule_id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("select user_alba_schedule")?;

        row.map(Schedule::try_from).transpose()
    }

    async fn list_recurring(&self, user_id: Uuid) -> anyhow::Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM user_alba_schedule
             WHERE user_id = ? AND repeat_type IN ('daily', 'weekly', 'biweekly')"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("select recurring schedules")?;

        rows.into_iter().map(Schedule::try_from).collect()
    }

    async fn update(&self, schedule: &Schedule) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE user_alba_schedule
            SET workplace = ?, work_date = ?, work_time = ?, day_of_week = ?,
                repeat_type = ?, repeat_days = ?, hourly_wage = ?, memo = ?
            WHERE user_alba_schedule_id = ? AND user_id = ?
            "#,
        )
        .bind(schedule.workplace.as_deref())
        .bind(schedule.work_date)
        .bind(schedule.work_time.map(|t| t.to_string()))
        .bind(schedule.day_of_week.map(|d| d.to_string()))
        .bind(schedule.repeat_type.map(|r| r.to_string()))
        .bind(schedule.repeat_days.as_ref().map(DayMask::as_str))
        .bind(schedule.hourly_wage)
        .bind(schedule.memo.as_deref())
        .bind(schedule.id)
        .bind(schedule.user_id)
        .execute(&self.pool)
        .await
        .context("update user_alba_schedule")?;

        Ok(())
    }

    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        // user_work_log rows follow through ON DELETE CASCADE
        let result = sqlx::query(
            "DELETE FROM user_alba_schedule WHERE user_alba_schedule_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("delete user_alba_schedule")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettlementRepository for MySqlStore {
    async fn set_status(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        status: SettlementStatus,
        settle: Option<(ShiftStatus, ShiftStatus)>,
    ) -> anyhow::Result<Option<u64>> {
        let mut tx = self.pool.begin().await.context("begin settlement update")?;

        let current = sqlx::query_scalar::<_, String>(
            "SELECT settlement_status FROM user_alba WHERE user_id = ? AND alba_id = ? FOR UPDATE",
        )
        .bind(user_id)
        .bind(posting_id)
        .fetch_optional(&mut *tx)
        .await
        .context("select user_alba")?;

        if current.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE user_alba SET settlement_status = ? WHERE user_id = ? AND alba_id = ?")
            .bind(status.to_string())
            .bind(user_id)
            .bind(posting_id)
            .execute(&mut *tx)
            .await
            .context("update user_alba")?;

        let mut moved = 0;
        if let Some((from, to)) = settle {
            moved = sqlx::query(
                r#"
                UPDATE user_work_log SET status = ?, updated_at = NOW()
                WHERE user_id = ? AND alba_id = ? AND status = ?
                "#,
            )
            .bind(to.to_string())
            .bind(user_id)
            .bind(posting_id)
            .bind(from.to_string())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("posting {from} -> {to} update"))?
            .rows_affected();
        }

        tx.commit().await.context("commit settlement update")?;
        Ok(Some(moved))
    }
}

#[async_trait]
impl UserRepository for MySqlStore {
    async fn income_goal(&self, user_id: Uuid) -> anyhow::Result<Option<Option<i64>>> {
        let goal = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT income_goal FROM `user` WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("select income_goal")?;

        Ok(goal)
    }

    async fn set_income_goal(&self, user_id: Uuid, goal: Option<i64>) -> anyhow::Result<bool> {
        if self.income_goal(user_id).await?.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE `user` SET income_goal = ? WHERE user_id = ?")
            .bind(goal)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("update income_goal")?;

        Ok(true)
    }
}
