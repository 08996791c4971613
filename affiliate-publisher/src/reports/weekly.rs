use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{round_to, TrafficTotals};
use crate::types::Result;

const WINDOW_DAYS: i64 = 7;
const REVENUE_GOAL_USD: f64 = 1.0;
const MAX_PROGRESS_PERCENT: f64 = 999.0;

/// The seven days ending yesterday.
pub fn weekly_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = today - Duration::days(1);
    (end - Duration::days(WINDOW_DAYS - 1), end)
}

/// Weekly revenue report inputs
#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
    pub traffic: TrafficTotals,
    pub default_epc_usd: f64,
    pub adsense_revenue_usd: f64,
    pub traffic_source: String,
    pub adsense_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub report: String,
    pub pv: i64,
    pub clicks: i64,
    pub traffic_source: String,
    pub adsense_source: String,
    pub affiliate_estimated_revenue_usd: f64,
    pub adsense_revenue_usd: f64,
    pub total_revenue_usd: f64,
    pub week: String,
}

impl WeeklyReport {
    pub fn affiliate_revenue_usd(&self) -> f64 {
        self.traffic.clicks as f64 * self.default_epc_usd
    }

    pub fn total_revenue_usd(&self) -> f64 {
        self.affiliate_revenue_usd() + self.adsense_revenue_usd
    }

    /// ISO year and week of the window's last day.
    pub fn iso_week(&self) -> (i32, u32) {
        let week = self.end_day.iso_week();
        (week.year(), week.week())
    }

    pub fn file_name(&self) -> String {
        let (year, week) = self.iso_week();
        format!("weekly-{}-{:02}.md", year, week)
    }

    pub fn render_markdown(&self) -> String {
        let affiliate = self.affiliate_revenue_usd();
        let total = self.total_revenue_usd();
        let goal = if total >= REVENUE_GOAL_USD { "達成" } else { "未達" };
        let progress = (total / REVENUE_GOAL_USD * 100.0).min(MAX_PROGRESS_PERCENT);

        let lines = [
            "# Weekly Revenue Report".to_string(),
            String::new(),
            format!("- 期間: {} 〜 {}", self.start_day, self.end_day),
            format!("- データソース(トラフィック): {}", self.traffic_source),
            format!("- データソース(AdSense): {}", self.adsense_source),
            format!("- 目標(合算収益 $1): {}", goal),
            format!("- 目標進捗: {:.1}%", progress),
            String::new(),
            "## Metrics".to_string(),
            format!("- PV: {}", self.traffic.pv),
            format!("- Affiliate Clicks: {}", self.traffic.clicks),
            format!("- CTR: {:.2}%", self.traffic.ctr() * 100.0),
            format!("- Affiliate推定収益(USD): ${:.2}", affiliate),
            format!("- AdSense収益(USD): ${:.2}", self.adsense_revenue_usd),
            format!("- 合算収益(USD): ${:.2}", total),
            format!("- EPC(固定): ${:.4}", self.default_epc_usd),
            String::new(),
            "## Notes".to_string(),
            "- Affiliate推定収益はクリック数 x 固定EPCで算出しています。".to_string(),
            format!("- AdSense収益は {} の手入力値を使用しています。", self.adsense_source),
            "- 実売上はASPおよびAdSense管理画面で確認してください。".to_string(),
        ];
        lines.join("\n") + "\n"
    }

    /// Write the report under `reports_dir`, returning its path.
    pub fn write(&self, reports_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(reports_dir)?;
        let path = reports_dir.join(self.file_name());
        std::fs::write(&path, self.render_markdown())?;
        info!("Wrote weekly report {}", path.display());
        Ok(path)
    }

    pub fn summary(&self, report_path: &Path) -> WeeklySummary {
        let (year, week) = self.iso_week();
        WeeklySummary {
            report: report_path.display().to_string(),
            pv: self.traffic.pv,
            clicks: self.traffic.clicks,
            traffic_source: self.traffic_source.clone(),
            adsense_source: self.adsense_source.clone(),
            affiliate_estimated_revenue_usd: round_to(self.affiliate_revenue_usd(), 4),
            adsense_revenue_usd: round_to(self.adsense_revenue_usd, 4),
            total_revenue_usd: round_to(self.total_revenue_usd(), 4),
            week: format!("{}-W{:02}", year, week),
        }
    }
}
