use affiliate_publisher::reports::ad_revenue::validate_ad_revenue;
use affiliate_publisher::reports::keywords::normalize_keyword;
use affiliate_publisher::reports::{
    read_ad_revenue_rows, refresh_keyword_pool, sum_ad_revenue, sum_traffic, weekly_window,
    MonetizationAudit, TrafficTotals, WeeklyReport,
};
use affiliate_publisher::{MetricsRow, PublisherError, Result, ToolRow, TopicRow};
use chrono::NaiveDate;
use tempfile::TempDir;
use tracing::info;

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn tool(tool_id: &str, name: &str, affiliate_url: &str, status: &str) -> ToolRow {
    ToolRow {
        tool_id: tool_id.to_string(),
        name: name.to_string(),
        official_url: format!("https://{}.test", tool_id),
        affiliate_url: affiliate_url.to_string(),
        status: status.to_string(),
        ..ToolRow::default()
    }
}

fn metrics(date: &str, pv: &str, clicks: &str) -> MetricsRow {
    MetricsRow {
        date: date.to_string(),
        pv: pv.to_string(),
        clicks: clicks.to_string(),
    }
}

#[test]
fn test_refresh_keywords_adds_seeded_rows_when_pool_is_low() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let keywords = vec![
        TopicRow::new("既存キーワード", "意図", 10),
        TopicRow::new("canva活用事例", "意図", 5),
    ];
    let tools = vec![tool("tool-1", "Canva", "https://aff.test/canva", "approved")];

    let refresh = refresh_keyword_pool(&keywords, &tools, 10, 20);
    info!("Added {:?}", refresh.sample);

    // "Canva 活用 事例" collides with the existing whitespace-free row
    assert_eq!(refresh.added, 4);
    assert_eq!(refresh.active_count_before, 2);
    assert_eq!(refresh.active_count_after, 6);
    assert_eq!(refresh.additions[0].keyword, "Canva 料金 比較");
    assert!(refresh.additions.iter().all(|row| row.status == "new" && row.last_used_at.is_empty()));
    assert_eq!(refresh.additions[1].priority, "10");

    let merged = refresh.merged(&keywords);
    assert_eq!(merged.len(), 6);
    assert_eq!(merged[0], keywords[0]);
}

#[test]
fn test_refresh_keywords_respects_limits() {
    let tools = vec![
        tool("t1", "Alpha", "", "pending"),
        tool("t2", " ", "", "pending"),
        tool("t3", "Beta", "", "pending"),
    ];

    let refresh = refresh_keyword_pool(&[], &tools, 80, 7);
    assert_eq!(refresh.added, 7);
    assert_eq!(refresh.additions[5].keyword, "Beta 活用 事例");

    let mut paused = TopicRow::new("paused", "", 1);
    paused.status = "paused".to_string();
    let full: Vec<TopicRow> = (0..3).map(|i| TopicRow::new(format!("k{}", i), "", 1)).collect();
    let refresh = refresh_keyword_pool(&full, &tools, 3, 7);
    assert_eq!(refresh.added, 0);
    assert_eq!(refresh.reason, Some("pool_sufficient"));

    let with_paused: Vec<TopicRow> = full.iter().take(2).cloned().chain(Some(paused)).collect();
    let refresh = refresh_keyword_pool(&with_paused, &tools, 3, 7);
    assert_eq!(refresh.added, 1);
}

#[test]
fn test_normalize_keyword() {
    assert_eq!(normalize_keyword(" Canva\t活用 事例 "), "canva活用事例");
}

#[test]
fn test_traffic_totals() {
    let rows = vec![
        metrics("2026-02-01", "100", "4"),
        metrics("2026-02-02", "50.0", "1"),
        metrics("bad-date", "1000", "100"),
        metrics("2026-02-03", "oops", "2"),
        metrics("2026-03-01", "999", "9"),
    ];

    let totals = sum_traffic(&rows, day(2026, 2, 1), day(2026, 2, 28));
    assert_eq!(totals, TrafficTotals { pv: 150, clicks: 7 });
    assert!((totals.ctr() - 7.0 / 150.0).abs() < 1e-9);
    assert_eq!(TrafficTotals::default().ctr(), 0.0);
}

#[test]
fn test_monetization_audit() {
    let tools = vec![
        tool("tool-1", "Canva", "https://px.a8.net/svt/ejp?a8mat=TEST", "approved"),
        tool("tool-2", "Notion", "https://example.com/a8/notion", "approved"),
        tool("tool-3", "Slack", "https://aff.test/slack", "pending"),
    ];
    let today = day(2026, 2, 28);
    let rows = vec![metrics("2026-02-28", "100", "4"), metrics("2026-01-01", "900", "90")];

    let audit = MonetizationAudit::build(&tools, &rows, today, 28, 0.01, 1.0);

    assert_eq!(audit.ready_tools, vec!["Canva".to_string()]);
    assert_eq!(audit.pending_tools_count, 2);
    assert_eq!(audit.pending_tools[0].name, "Notion");
    assert_eq!(audit.recent_pv, 100);
    assert_eq!(audit.recent_clicks, 4);
    assert_eq!(audit.recent_ctr, 4.0);
    assert_eq!(audit.recent_estimated_revenue_usd, 0.04);
    assert_eq!(audit.needed_clicks_daily, Some(100.0));
    assert_eq!(audit.needed_pv_daily_at_current_ctr, Some(2500.0));

    let idle = MonetizationAudit::build(&tools, &[], today, 28, 0.01, 0.0);
    assert_eq!(idle.target_daily_usd, 0.01);
    assert_eq!(idle.needed_pv_daily_at_current_ctr, None);
}

fn write_ad_revenue(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("ad_revenue.csv");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_ad_revenue_valid_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_ad_revenue(
        &dir,
        "date,adsense_revenue_usd,source,note\n\
2026-02-10,0.45,adsense , week1\n\
2026-02-11,1.20,adsense,week1\n\
2026-02-20,3.00,adsense,later\n",
    );

    let rows = read_ad_revenue_rows(&path)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].source, "adsense");
    assert_eq!(rows[0].note, "week1");

    let total = sum_ad_revenue(&rows, day(2026, 2, 10), day(2026, 2, 11))?;
    assert!((total - 1.65).abs() < 1e-9);

    let validation = validate_ad_revenue(&path)?;
    assert_eq!(validation.rows, 3);
    assert_eq!(validation.total_adsense_revenue_usd, 4.65);
    Ok(())
}

#[test]
fn test_ad_revenue_rejects_bad_files() -> Result<()> {
    let dir = TempDir::new()?;

    let missing = dir.path().join("absent.csv");
    assert!(matches!(read_ad_revenue_rows(&missing), Err(PublisherError::InvalidData(_))));

    let path = write_ad_revenue(&dir, "date,adsense_revenue_usd,source\n2026-02-10,0.45,adsense\n");
    assert!(matches!(read_ad_revenue_rows(&path), Err(PublisherError::MissingColumns { .. })));

    let path = write_ad_revenue(&dir, "date,adsense_revenue_usd,source,note\n2026-02-10,-0.45,adsense,bad\n");
    match read_ad_revenue_rows(&path) {
        Err(PublisherError::InvalidData(message)) => {
            assert_eq!(message, "negative revenue is not allowed: -0.45")
        }
        other => panic!("expected invalid data, got {:?}", other),
    }

    let path = write_ad_revenue(&dir, "date,adsense_revenue_usd,source,note\n02/10/2026,0.45,adsense,bad\n");
    assert!(matches!(read_ad_revenue_rows(&path), Err(PublisherError::InvalidData(_))));
    Ok(())
}

fn weekly_report() -> WeeklyReport {
    let (start_day, end_day) = weekly_window(day(2026, 2, 14));
    let rows = vec![
        metrics("2026-02-07", "100", "3"),
        metrics("2026-02-08", "120", "2"),
        metrics("2026-02-09", "130", "1"),
        metrics("2026-02-10", "140", "2"),
        metrics("2026-02-11", "150", "1"),
        metrics("2026-02-12", "160", "0"),
        metrics("2026-02-13", "170", "1"),
        metrics("2026-02-14", "999", "99"),
    ];
    WeeklyReport {
        start_day,
        end_day,
        traffic: sum_traffic(&rows, start_day, end_day),
        default_epc_usd: 0.01,
        adsense_revenue_usd: 0.70,
        traffic_source: "data/analytics_metrics.csv".to_string(),
        adsense_source: "data/ad_revenue.csv".to_string(),
    }
}

#[test]
fn test_weekly_window_ends_yesterday() {
    assert_eq!(weekly_window(day(2026, 2, 14)), (day(2026, 2, 7), day(2026, 2, 13)));
    assert_eq!(weekly_window(day(2026, 3, 1)), (day(2026, 2, 22), day(2026, 2, 28)));
}

#[test]
fn test_weekly_report_includes_adsense_and_total() -> Result<()> {
    let report = weekly_report();
    assert_eq!(report.traffic, TrafficTotals { pv: 970, clicks: 10 });

    let markdown = report.render_markdown();
    assert!(markdown.starts_with("# Weekly Revenue Report\n"));
    assert!(markdown.contains("- 期間: 2026-02-07 〜 2026-02-13"));
    assert!(markdown.contains("- Affiliate推定収益(USD): $0.10"));
    assert!(markdown.contains("- AdSense収益(USD): $0.70"));
    assert!(markdown.contains("- 合算収益(USD): $0.80"));
    assert!(markdown.contains("- 目標(合算収益 $1): 未達"));
    assert!(markdown.contains("- 目標進捗: 80.0%"));

    let dir = TempDir::new()?;
    let path = report.write(&dir.path().join("reports"))?;
    assert!(path.ends_with("weekly-2026-07.md"));
    assert_eq!(std::fs::read_to_string(&path)?, markdown);

    let summary = report.summary(&path);
    assert_eq!(summary.week, "2026-W07");
    assert_eq!(summary.total_revenue_usd, 0.8);
    Ok(())
}
