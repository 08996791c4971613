use crate::store::CsvStore;
use crate::types::{AdRevenueRow, PublisherError, Result, RowStore};
use crate::utils::time::parse_iso_date;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::round_to;

#[derive(Debug, Clone, Serialize)]
pub struct AdRevenueValidation {
    pub file: String,
    pub rows: usize,
    pub total_adsense_revenue_usd: f64,
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    parse_iso_date(value.trim())
        .ok_or_else(|| PublisherError::InvalidData(format!("invalid date: {}", value)))
}

fn parse_revenue(value: &str) -> Result<f64> {
    let amount: f64 = value
        .trim()
        .parse()
        .map_err(|_| PublisherError::InvalidData(format!("invalid float: {}", value)))?;
    if amount < 0.0 {
        return Err(PublisherError::InvalidData(format!(
            "negative revenue is not allowed: {}",
            value
        )));
    }
    Ok(amount)
}

/// Load the manually maintained AdSense revenue file, rejecting any row
/// with a non-ISO date or a negative or non-numeric amount.
pub fn read_ad_revenue_rows(path: &Path) -> Result<Vec<AdRevenueRow>> {
    let store = CsvStore::<AdRevenueRow>::new(path);
    if !store.exists() {
        return Err(PublisherError::InvalidData(format!(
            "{} does not exist",
            path.display()
        )));
    }

    let mut rows = store.load()?;
    for row in &mut rows {
        parse_day(&row.date)?;
        parse_revenue(&row.adsense_revenue_usd)?;
        row.source = row.source.trim().to_string();
        row.note = row.note.trim().to_string();
    }
    Ok(rows)
}

/// Revenue over `start..=end`; rows are expected to be validated already.
pub fn sum_ad_revenue(rows: &[AdRevenueRow], start: NaiveDate, end: NaiveDate) -> Result<f64> {
    let mut total = 0.0;
    for row in rows {
        let day = parse_day(&row.date)?;
        if start <= day && day <= end {
            total += parse_revenue(&row.adsense_revenue_usd)?;
        }
    }
    Ok(total)
}

pub fn validate_ad_revenue(path: &Path) -> Result<AdRevenueValidation> {
    let rows = read_ad_revenue_rows(path)?;
    let total = rows
        .iter()
        .map(|row| parse_revenue(&row.adsense_revenue_usd))
        .sum::<Result<f64>>()?;

    info!("Validated {} ad revenue rows in {}", rows.len(), path.display());
    Ok(AdRevenueValidation {
        file: path.display().to_string(),
        rows: rows.len(),
        total_adsense_revenue_usd: round_to(total, 4),
    })
}
