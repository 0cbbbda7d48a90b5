pub mod schedule;
pub mod settlement;
pub mod work_log;
