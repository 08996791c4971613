use crate::types::{ToolRow, TopicRow};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Per-tool keyword seeds: pattern, intent, priority.
pub const SEED_TEMPLATES: &[(&str, &str, i64)] = &[
    ("{tool} 活用 事例", "導入効果の具体例を知りたい", 9),
    ("{tool} 料金 比較", "費用対効果を見極めたい", 9),
    ("{tool} 導入 手順", "失敗しない導入手順を確認したい", 10),
    ("{tool} 使い方 初心者", "まず何から始めるべきか知りたい", 8),
    ("{tool} 業務効率化", "実務での時短方法を知りたい", 8),
];

const SAMPLE_SIZE: usize = 5;

/// Result of a pool refresh. `additions` still has to be appended to the
/// keyword store by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordRefresh {
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub active_count_before: usize,
    pub active_count_after: usize,
    pub target_min_pool: usize,
    pub sample: Vec<String>,
    #[serde(skip)]
    pub additions: Vec<TopicRow>,
}

/// Whitespace removed and lowercased, so `Canva 活用` and `canva活用` collide.
pub fn normalize_keyword(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn active_keyword_count(keywords: &[TopicRow]) -> usize {
    keywords
        .iter()
        .filter(|row| row.topic_status().is_selectable())
        .count()
}

/// Top the keyword pool up to `min_pool` active rows, adding at most
/// `max_add` seeded rows in tool order.
pub fn refresh_keyword_pool(
    keywords: &[TopicRow],
    tools: &[ToolRow],
    min_pool: usize,
    max_add: usize,
) -> KeywordRefresh {
    let min_pool = min_pool.max(1);
    let limit_cap = max_add.max(1);
    let active_count = active_keyword_count(keywords);
    let needed = min_pool.saturating_sub(active_count);

    if needed == 0 {
        info!("Keyword pool sufficient ({} active)", active_count);
        return KeywordRefresh {
            added: 0,
            reason: Some("pool_sufficient"),
            active_count_before: active_count,
            active_count_after: active_count,
            target_min_pool: min_pool,
            sample: Vec::new(),
            additions: Vec::new(),
        };
    }

    let limit = needed.min(limit_cap);
    let mut existing: HashSet<String> = keywords
        .iter()
        .filter(|row| !row.keyword.is_empty())
        .map(|row| normalize_keyword(&row.keyword))
        .collect();
    let mut additions: Vec<TopicRow> = Vec::new();

    'tools: for tool in tools {
        let tool_name = tool.name.trim();
        if tool_name.is_empty() {
            continue;
        }
        for (pattern, intent, priority) in SEED_TEMPLATES {
            if additions.len() >= limit {
                break 'tools;
            }
            let keyword = pattern.replace("{tool}", tool_name);
            if !existing.insert(normalize_keyword(&keyword)) {
                debug!("Keyword '{}' already present", keyword);
                continue;
            }
            additions.push(TopicRow::new(keyword, *intent, *priority));
        }
    }

    info!("Adding {} keywords (needed {}, limit {})", additions.len(), needed, limit);
    KeywordRefresh {
        added: additions.len(),
        reason: None,
        active_count_before: active_count,
        active_count_after: active_count + additions.len(),
        target_min_pool: min_pool,
        sample: additions
            .iter()
            .take(SAMPLE_SIZE)
            .map(|row| row.keyword.clone())
            .collect(),
        additions,
    }
}

impl KeywordRefresh {
    /// Existing rows followed by the additions.
    pub fn merged(&self, keywords: &[TopicRow]) -> Vec<TopicRow> {
        keywords.iter().chain(self.additions.iter()).cloned().collect()
    }
}
