use crate::types::TopicRow;
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use tracing::debug;

/// Sentinel that sorts blank `last_used_at` values before any real date.
const NEVER_USED: &str = "0000-00-00";

/// Order: priority descending, then `last_used_at` ascending, then status.
fn compare_topics(a: &TopicRow, b: &TopicRow) -> Ordering {
    let last_used = |row: &TopicRow| {
        if row.last_used_at.is_empty() {
            NEVER_USED.to_string()
        } else {
            row.last_used_at.clone()
        }
    };

    b.priority_value()
        .cmp(&a.priority_value())
        .then_with(|| last_used(a).cmp(&last_used(b)))
        .then_with(|| a.status.cmp(&b.status))
}

/// Pick the next topic to write about.
///
/// Paused and archived rows are skipped. If any remaining row has never
/// been used, only never-used rows are considered.
pub fn select_topic(rows: &[TopicRow]) -> Option<&TopicRow> {
    let available: Vec<&TopicRow> = rows
        .iter()
        .filter(|row| row.topic_status().is_selectable())
        .collect();
    if available.is_empty() {
        return None;
    }

    let unused: Vec<&TopicRow> = available.iter().copied().filter(|row| row.is_unused()).collect();
    let mut candidates = if unused.is_empty() { available } else { unused };

    // Stable sort keeps file order among fully tied rows
    candidates.sort_by(|a, b| compare_topics(a, b));

    let selected = candidates.first().copied();
    if let Some(topic) = selected {
        debug!(
            "Selected topic '{}' (priority {}) from {} candidates",
            topic.keyword,
            topic.priority_value(),
            candidates.len()
        );
    }
    selected
}

/// Return a copy of `rows` with the topic matching `keyword` marked as used.
///
/// Sets `last_used_at` to the date of `used_at` and advances `new`, `ready`
/// and blank statuses to `used`. Every other row is cloned unchanged.
pub fn mark_topic_used(
    rows: &[TopicRow],
    keyword: &str,
    used_at: DateTime<FixedOffset>,
) -> Vec<TopicRow> {
    rows.iter()
        .map(|row| {
            let mut updated = row.clone();
            if row.keyword == keyword {
                updated.last_used_at = used_at.date_naive().format("%Y-%m-%d").to_string();
                if row.topic_status().advances_on_use() {
                    updated.status = "used".to_string();
                }
            }
            updated
        })
        .collect()
}
