use crate::types::{PublisherError, Result, ToolRow};
use crate::utils::time::parse_date_or_epoch;
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;
use tracing::debug;

/// Fragments that mark an affiliate URL as a sample or unfilled value.
const PLACEHOLDER_TOKENS: &[&str] = &["example.com", "replace-me", "your-affiliate-link", "<", ">"];

pub fn is_placeholder_url(url: &str) -> bool {
    let value = url.trim().to_lowercase();
    value.is_empty() || PLACEHOLDER_TOKENS.iter().any(|token| value.contains(token))
}

/// Ready status and a real affiliate link.
pub fn is_monetizable(tool: &ToolRow) -> bool {
    tool.tool_status().is_ready() && !is_placeholder_url(&tool.affiliate_url)
}

/// Pick the next tool to promote.
///
/// Monetizable tools not in `excluded_tool_ids` win. Without any, the
/// non-excluded rows are used, and if exclusion empties the pool every row
/// is eligible again. Among candidates the oldest `last_posted_at` wins,
/// with blank or malformed dates counting as 1970-01-01.
pub fn select_tool<'a>(rows: &'a [ToolRow], excluded_tool_ids: &HashSet<String>) -> Result<&'a ToolRow> {
    if rows.is_empty() {
        return Err(PublisherError::EmptyInput("tools store has no rows".to_string()));
    }

    let not_excluded = |row: &&ToolRow| !excluded_tool_ids.contains(&row.tool_id);

    let monetizable: Vec<&ToolRow> = rows
        .iter()
        .filter(not_excluded)
        .filter(|row| is_monetizable(row))
        .collect();

    let mut candidates = if !monetizable.is_empty() {
        monetizable
    } else {
        let remaining: Vec<&ToolRow> = rows.iter().filter(not_excluded).collect();
        if remaining.is_empty() {
            debug!("Every tool is excluded for this run, reusing the full pool");
            rows.iter().collect()
        } else {
            remaining
        }
    };

    candidates.sort_by_key(|row| parse_date_or_epoch(&row.last_posted_at));

    // rows is non-empty, so some candidate set is non-empty
    candidates
        .first()
        .copied()
        .ok_or_else(|| PublisherError::EmptyInput("no tool candidates".to_string()))
}

/// Choose the outbound URL for a tool's call-to-action links.
///
/// Order: a real affiliate link on a ready tool, then the official URL,
/// then any non-placeholder affiliate link.
pub fn resolve_cta_url(tool: &ToolRow) -> Result<String> {
    let affiliate_url = tool.affiliate_url.trim();
    let official_url = tool.official_url.trim();

    if tool.tool_status().is_ready() && !is_placeholder_url(affiliate_url) {
        return Ok(affiliate_url.to_string());
    }
    if !official_url.is_empty() {
        return Ok(official_url.to_string());
    }
    if !is_placeholder_url(affiliate_url) {
        return Ok(affiliate_url.to_string());
    }

    let name = if tool.name.is_empty() { "unknown" } else { tool.name.as_str() };
    Err(PublisherError::NoUsableUrl { tool: name.to_string() })
}

/// Return a copy of `rows` with `last_posted_at` set on the matching tool.
pub fn mark_tool_posted(
    rows: &[ToolRow],
    tool_id: &str,
    posted_at: DateTime<FixedOffset>,
) -> Vec<ToolRow> {
    rows.iter()
        .map(|row| {
            let mut updated = row.clone();
            if row.tool_id == tool_id {
                updated.last_posted_at = posted_at.date_naive().format("%Y-%m-%d").to_string();
            }
            updated
        })
        .collect()
}
