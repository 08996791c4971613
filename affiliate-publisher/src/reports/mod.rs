pub mod ad_revenue;
pub mod audit;
pub mod keywords;
pub mod weekly;

use crate::types::MetricsRow;
use crate::utils::time::parse_iso_date;
use chrono::NaiveDate;
use serde::Serialize;

pub use ad_revenue::{read_ad_revenue_rows, sum_ad_revenue, AdRevenueValidation};
pub use audit::MonetizationAudit;
pub use keywords::{refresh_keyword_pool, KeywordRefresh};
pub use weekly::{weekly_window, WeeklyReport};

/// Traffic totals over a date window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficTotals {
    pub pv: i64,
    pub clicks: i64,
}

impl TrafficTotals {
    /// Click-through rate as a fraction, zero without page views.
    pub fn ctr(&self) -> f64 {
        if self.pv > 0 {
            self.clicks as f64 / self.pv as f64
        } else {
            0.0
        }
    }
}

/// Sum metrics rows whose date falls in `start..=end`. Rows with malformed
/// dates are skipped and unparsable counts add nothing.
pub fn sum_traffic(rows: &[MetricsRow], start: NaiveDate, end: NaiveDate) -> TrafficTotals {
    rows.iter()
        .filter(|row| {
            parse_iso_date(row.date.trim())
                .map(|day| start <= day && day <= end)
                .unwrap_or(false)
        })
        .fold(TrafficTotals::default(), |totals, row| TrafficTotals {
            pv: totals.pv + count_value(&row.pv),
            clicks: totals.clicks + count_value(&row.clicks),
        })
}

/// Whole-number count, accepting decimal text such as `12.0`.
fn count_value(value: &str) -> i64 {
    value.trim().parse::<f64>().map(|count| count as i64).unwrap_or(0)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
