//! Use cases sitting between the HTTP handlers and the repositories.

pub mod income;
pub mod schedule;
pub mod settlement;
pub mod work_log;
