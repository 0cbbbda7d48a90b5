//! Income calculations derived from shifts, rates and settlement status.
//!
//! Everything here is pure. Expected income always uses the same floor
//! formula so the dashboard, today list and settlement list agree.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::work_log::WorkLogDetail;

/// Catch-all ("other") brand bucket.
pub const OTHER_BRAND: &str = "기타";

/// Store-name suffixes meaning "branch", longest first.
const BRANCH_SUFFIXES: [&str; 3] = ["지점", "점포", "점"];

/// `floor(minutes * hourly_rate / 60)`; zero for non-positive inputs.
pub fn expected_income(minutes: i64, hourly_rate: i64) -> i64 {
    if minutes <= 0 || hourly_rate <= 0 {
        return 0;
    }
    minutes * hourly_rate / 60
}

/// Hours rounded to one decimal place, for display.
pub fn work_hours(minutes: i64) -> f64 {
    (minutes.max(0) as f64 / 60.0 * 10.0).round() / 10.0
}

/// Income a shift is expected to earn, or `None` when it has no usable
/// duration or no posting rate (such shifts are left out of sums).
pub fn shift_expected_income(detail: &WorkLogDetail) -> Option<i64> {
    let minutes = detail.log.effective_minutes()?;
    let rate = detail.hourly_rate?;
    if minutes <= 0 || rate <= 0 {
        return None;
    }
    Some(expected_income(minutes, rate))
}

/// Actual income accrues from the expected formula once the posting is paid.
pub fn shift_actual_income(detail: &WorkLogDetail) -> i64 {
    let paid = detail
        .settlement
        .is_some_and(|status| status.counts_toward_actual());
    match (paid, shift_expected_income(detail)) {
        (true, Some(income)) => income,
        _ => 0,
    }
}

/// Reduces a store display name to its brand.
///
/// Drops parenthesized parts, a trailing branch marker, then keeps the first
/// whitespace-delimited token.
pub fn brand_key(store_name: &str) -> String {
    let mut name = String::with_capacity(store_name.len());
    let mut rest = store_name.trim();
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        name.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    name.push_str(rest);

    let mut name = name.trim();
    if let Some(stripped) = BRANCH_SUFFIXES.iter().find_map(|s| name.strip_suffix(*s)) {
        name = stripped.trim();
    }

    match name.split_whitespace().next() {
        Some(token) => token.to_string(),
        None => OTHER_BRAND.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BrandIncome {
    #[schema(example = "메가MGC커피")]
    pub key: String,
    #[schema(example = 20000)]
    pub income: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlyIncome {
    pub expected_income: i64,
    pub actual_income: i64,
    pub breakdown: Vec<BrandIncome>,
}

/// Sums a month of shifts into expected/actual income and a brand
/// breakdown of the actual income, largest first.
pub fn aggregate(details: &[WorkLogDetail]) -> MonthlyIncome {
    let mut totals = MonthlyIncome::default();
    let mut by_brand: HashMap<String, i64> = HashMap::new();

    for detail in details {
        let Some(income) = shift_expected_income(detail) else {
            continue;
        };
        totals.expected_income += income;

        let actual = shift_actual_income(detail);
        if actual == 0 {
            continue;
        }
        totals.actual_income += actual;

        let key = detail
            .store_name
            .as_deref()
            .map(brand_key)
            .unwrap_or_else(|| OTHER_BRAND.to_string());
        *by_brand.entry(key).or_default() += actual;
    }

    let mut breakdown: Vec<BrandIncome> = by_brand
        .into_iter()
        .map(|(key, income)| BrandIncome { key, income })
        .collect();
    breakdown.sort_by(|a, b| b.income.cmp(&a.income).then_with(|| a.key.cmp(&b.key)));
    totals.breakdown = breakdown;
    totals
}

/// Half-open calendar month `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthRange {
    /// Parses `YYYY-MM`, or uses the month containing `today` when absent.
    pub fn resolve(month: Option<&str>, today: NaiveDate) -> AppResult<Self> {
        let start = match month.map(str::trim).filter(|m| !m.is_empty()) {
            Some(month) => parse_month(month)?,
            None => today.with_day(1).unwrap_or(today),
        };
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| AppError::validation("month is out of range"))?;
        Ok(MonthRange { start, end })
    }

    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

fn parse_month(month: &str) -> AppResult<NaiveDate> {
    let invalid = || AppError::validation(format!("month '{month}' must be in YYYY-MM format"));
    let (year, mon) = month.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || mon.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let mon: u32 = mon.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)
}
