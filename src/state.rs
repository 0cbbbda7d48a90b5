//! Services shared by every request handler.

use std::sync::Arc;

use crate::clock::Clock;
use crate::repository::{
    ScheduleRepository, SettlementRepository, UserRepository, WorkLogRepository,
};
use crate::service::income::IncomeService;
use crate::service::schedule::ScheduleService;
use crate::service::settlement::SettlementService;
use crate::service::work_log::WorkLogService;

#[derive(Clone)]
pub struct AppState {
    pub work_logs: Arc<WorkLogService>,
    pub schedules: Arc<ScheduleService>,
    pub income: Arc<IncomeService>,
    pub settlements: Arc<SettlementService>,
}

impl AppState {
    /// Wires every service to one store implementing all repositories.
    pub fn from_store<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Self
    where
        S: WorkLogRepository + ScheduleRepository + SettlementRepository + UserRepository + 'static,
    {
        Self {
            work_logs: Arc::new(WorkLogService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
            )),
            schedules: Arc::new(ScheduleService::new(store.clone(), store.clone())),
            income: Arc::new(IncomeService::new(store.clone(), store.clone(), clock)),
            settlements: Arc::new(SettlementService::new(store.clone(), store)),
        }
    }
}
