use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::engine::income::{shift_actual_income, shift_expected_income};
use crate::engine::transition::edge;
use crate::error::{AppError, AppResult};
use crate::model::settlement::SettlementStatus;
use crate::model::work_log::{ShiftAction, WorkLogDetail};
use crate::models::{
    SettlementItem, SettlementListQuery, SettlementListResponse, SettlementUpdateResponse,
};
use crate::repository::{SettlementPageQuery, SettlementRepository, WorkLogRepository};

pub const MAX_PAGE_SIZE: u32 = 20;

pub struct SettlementService {
    work_logs: Arc<dyn WorkLogRepository>,
    settlements: Arc<dyn SettlementRepository>,
}

fn to_item(detail: &WorkLogDetail) -> SettlementItem {
    SettlementItem {
        work_log_id: detail.log.id,
        work_date: detail.log.work_date,
        store_name: detail.workplace().to_string(),
        work_minutes: detail.log.effective_minutes().unwrap_or(0),
        expected_income: shift_expected_income(detail).unwrap_or(0),
        actual_income: shift_actual_income(detail),
        recorded_amount: detail.recorded_amount,
        settlement_status: detail.settlement.unwrap_or_default(),
    }
}

impl SettlementService {
    pub fn new(
        work_logs: Arc<dyn WorkLogRepository>,
        settlements: Arc<dyn SettlementRepository>,
    ) -> Self {
        Self {
            work_logs,
            settlements,
        }
    }

    #[instrument(name = "settlement_list", skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        query: SettlementListQuery,
    ) -> AppResult<SettlementListResponse> {
        let size = query.size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let cursor = match query.cursor.as_deref().filter(|c| !c.is_empty()) {
            None => None,
            Some(raw) => {
                let id = Uuid::parse_str(raw)
                    .map_err(|_| AppError::validation(format!("cursor '{raw}' is not a valid id")))?;
                let detail = self
                    .work_logs
                    .find_detail(user_id, id)
                    .await?
                    .ok_or_else(|| AppError::validation("cursor does not point to one of your work logs"))?;
                Some((detail.log.work_date, id))
            }
        };

        let mut page = self
            .work_logs
            .settlement_page(&SettlementPageQuery {
                user_id,
                status: query.status.unwrap_or_default().status(),
                order: query.sort.unwrap_or_default(),
                cursor,
                limit: size + 1,
            })
            .await?;

        let has_next = page.len() > size as usize;
        page.truncate(size as usize);
        let next_cursor = if has_next {
            page.last().map(|d| d.log.id)
        } else {
            None
        };

        let items: Vec<SettlementItem> = page.iter().map(to_item).collect();
        Ok(SettlementListResponse {
            total_expected_income: items.iter().map(|i| i.expected_income).sum(),
            total_actual_income: items.iter().map(|i| i.actual_income).sum(),
            items,
            has_next,
            next_cursor,
        })
    }

    /// Records the caller's settlement status for a posting. `paid` is the
    /// settlement event: every finished shift of that posting becomes settled
    /// in the same transaction. Shifts finishing later are settled by the sweep.
    #[instrument(name = "settlement_update", skip(self))]
    pub async fn set_status(
        &self,
        user_id: Uuid,
        posting_id: Uuid,
        status: SettlementStatus,
    ) -> AppResult<SettlementUpdateResponse> {
        let settle = match status {
            SettlementStatus::Paid => Some(edge(ShiftAction::Settle)),
            SettlementStatus::Waiting | SettlementStatus::Unpaid => None,
        };
        let settled_shifts = self
            .settlements
            .set_status(user_id, posting_id, status, settle)
            .await?
            .ok_or_else(|| AppError::not_found("settlement record"))?;

        info!(%status, settled_shifts, "settlement status stored");
        Ok(SettlementUpdateResponse {
            posting_id,
            settlement_status: status,
            settled_shifts,
        })
    }
}
