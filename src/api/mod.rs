use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod income;
pub mod schedule;
pub mod settlement;
pub mod work_log;

/// Path ids arrive as strings so a malformed id renders as a validation
/// failure in the envelope instead of a bare 404.
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::validation(format!("{what} '{raw}' is not a valid id")))
}
