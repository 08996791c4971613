use crate::tool::is_monetizable;
use crate::types::{MetricsRow, ToolRow};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::{round_to, sum_traffic, TrafficTotals};

pub const DEFAULT_WINDOW_DAYS: i64 = 28;
pub const DEFAULT_TARGET_DAILY_USD: f64 = 1.0;
const MIN_TARGET_DAILY_USD: f64 = 0.01;

const FOLLOW_UP_ACTIONS: &[&str] = &[
    "tools.csv の affiliate_url を実リンクに更新",
    "承認済み案件の status を approved か active に更新",
    "Daily Publish を毎日実行し、記事数を増やす",
];

#[derive(Debug, Clone, Serialize)]
pub struct PendingTool {
    pub name: String,
    pub status: String,
    pub affiliate_url: String,
}

/// Monetization readiness of the tool catalog plus recent traffic economics.
#[derive(Debug, Clone, Serialize)]
pub struct MonetizationAudit {
    pub window_days: i64,
    pub ready_tools_count: usize,
    pub ready_tools: Vec<String>,
    pub pending_tools_count: usize,
    pub pending_tools: Vec<PendingTool>,
    pub recent_pv: i64,
    pub recent_clicks: i64,
    /// Percent, two decimals.
    pub recent_ctr: f64,
    pub default_epc_usd: f64,
    pub recent_estimated_revenue_usd: f64,
    pub target_daily_usd: f64,
    pub needed_clicks_daily: Option<f64>,
    pub needed_pv_daily_at_current_ctr: Option<f64>,
    pub actions: Vec<String>,
}

impl MonetizationAudit {
    /// Audit `tools` against metrics in the `window_days` ending on `today`.
    pub fn build(
        tools: &[ToolRow],
        metrics: &[MetricsRow],
        today: NaiveDate,
        window_days: i64,
        default_epc_usd: f64,
        target_daily_usd: f64,
    ) -> Self {
        let window_days = window_days.max(1);
        let start = today - Duration::days(window_days - 1);
        let traffic: TrafficTotals = sum_traffic(metrics, start, today);

        let (ready, pending): (Vec<&ToolRow>, Vec<&ToolRow>) =
            tools.iter().partition(|tool| is_monetizable(tool));
        // A tool_id with any ready row counts as ready
        let ready_ids: Vec<&str> = ready.iter().map(|tool| tool.tool_id.as_str()).collect();
        let pending: Vec<&ToolRow> = pending
            .into_iter()
            .filter(|tool| !ready_ids.contains(&tool.tool_id.as_str()))
            .collect();

        let ctr = traffic.ctr();
        let target_daily_usd = target_daily_usd.max(MIN_TARGET_DAILY_USD);
        let needed_clicks = (default_epc_usd > 0.0).then(|| target_daily_usd / default_epc_usd);
        let needed_pv = needed_clicks.filter(|_| ctr > 0.0).map(|clicks| clicks / ctr);

        Self {
            window_days,
            ready_tools_count: ready.len(),
            ready_tools: ready.iter().map(|tool| tool.name.clone()).collect(),
            pending_tools_count: pending.len(),
            pending_tools: pending
                .iter()
                .map(|tool| PendingTool {
                    name: tool.name.clone(),
                    status: tool.status.clone(),
                    affiliate_url: tool.affiliate_url.clone(),
                })
                .collect(),
            recent_pv: traffic.pv,
            recent_clicks: traffic.clicks,
            recent_ctr: round_to(ctr * 100.0, 2),
            default_epc_usd,
            recent_estimated_revenue_usd: round_to(traffic.clicks as f64 * default_epc_usd, 4),
            target_daily_usd,
            needed_clicks_daily: needed_clicks.map(|clicks| round_to(clicks, 2)),
            needed_pv_daily_at_current_ctr: needed_pv.map(|pv| round_to(pv, 2)),
            actions: FOLLOW_UP_ACTIONS.iter().map(|action| action.to_string()).collect(),
        }
    }
}
