use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Payment status of a (user, posting) pair. Independent of shift status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettlementStatus {
    #[default]
    Waiting,
    Paid,
    Unpaid,
}

impl SettlementStatus {
    /// Only confirmed payments accrue actual income.
    pub fn counts_toward_actual(&self) -> bool {
        matches!(self, SettlementStatus::Paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_only_paid_counts() {
        assert!(SettlementStatus::Paid.counts_toward_actual());
        assert!(!SettlementStatus::Unpaid.counts_toward_actual());
        assert!(!SettlementStatus::Waiting.counts_toward_actual());
    }

    #[test]
    fn test_parse_from_db_literal() {
        assert_eq!(SettlementStatus::from_str("unpaid").unwrap(), SettlementStatus::Unpaid);
        assert_eq!(SettlementStatus::default(), SettlementStatus::Waiting);
    }
}
