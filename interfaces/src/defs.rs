use serde::{Deserialize, Serialize};

/// A record persisted as one line of a delimited text file.
///
/// `COLUMNS` is both the required header set on load and the column
/// order written on save.
pub trait CsvRecord {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicStatus {
    New,
    Ready,
    Used,
    Paused,
    Archived,
    Blank,
    Other(String),
}

impl TopicStatus {
    /// Case-insensitive, whitespace-tolerant parse.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "new" => Self::New,
            "ready" => Self::Ready,
            "used" => Self::Used,
            "paused" => Self::Paused,
            "archived" => Self::Archived,
            "" => Self::Blank,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Ready => "ready",
            Self::Used => "used",
            Self::Paused => "paused",
            Self::Archived => "archived",
            Self::Blank => "",
            Self::Other(value) => value,
        }
    }

    /// Paused and archived topics are never picked.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Paused | Self::Archived)
    }

    /// Statuses that advance to `used` once the topic is published.
    pub fn advances_on_use(&self) -> bool {
        matches!(self, Self::New | Self::Ready | Self::Blank)
    }
}

/// A candidate keyword + search intent pair awaiting an article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopicRow {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_used_at: String,
}

impl TopicRow {
    pub fn new(keyword: impl Into<String>, intent: impl Into<String>, priority: i64) -> Self {
        Self {
            keyword: keyword.into(),
            intent: intent.into(),
            priority: priority.to_string(),
            status: TopicStatus::New.as_str().to_string(),
            last_used_at: String::new(),
        }
    }

    /// Unparsable priorities count as 0.
    pub fn priority_value(&self) -> i64 {
        self.priority.trim().parse().unwrap_or(0)
    }

    pub fn topic_status(&self) -> TopicStatus {
        TopicStatus::parse(&self.status)
    }

    pub fn is_unused(&self) -> bool {
        self.last_used_at.is_empty()
    }
}

impl CsvRecord for TopicRow {
    const COLUMNS: &'static [&'static str] = &["keyword", "intent", "priority", "status", "last_used_at"];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Pending,
    Approved,
    Active,
    AffiliateReady,
    Other(String),
}

impl ToolStatus {
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "active" => Self::Active,
            "affiliate_ready" => Self::AffiliateReady,
            _ => Self::Other(normalized),
        }
    }

    /// Statuses under which an affiliate link may be published.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Approved | Self::Active | Self::AffiliateReady)
    }
}

/// A promotable product or service with its monetization metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolRow {
    #[serde(default)]
    pub tool_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub official_url: String,
    #[serde(default)]
    pub affiliate_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_posted_at: String,
}

impl ToolRow {
    pub fn tool_status(&self) -> ToolStatus {
        ToolStatus::parse(&self.status)
    }
}

impl CsvRecord for ToolRow {
    const COLUMNS: &'static [&'static str] = &[
        "tool_id",
        "name",
        "category",
        "official_url",
        "affiliate_url",
        "status",
        "last_posted_at",
    ];
}

/// Monthly spend on generation, produced outside this system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostRow {
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub total_usd: String,
}

impl CsvRecord for CostRow {
    const COLUMNS: &'static [&'static str] = &["month", "total_usd"];
}

/// Daily traffic counts exported from analytics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsRow {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub pv: String,
    #[serde(default)]
    pub clicks: String,
}

impl CsvRecord for MetricsRow {
    const COLUMNS: &'static [&'static str] = &["date", "pv", "clicks"];
}

/// Manually entered AdSense revenue, one row per day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdRevenueRow {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub adsense_revenue_usd: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub note: String,
}

impl CsvRecord for AdRevenueRow {
    const COLUMNS: &'static [&'static str] = &["date", "adsense_revenue_usd", "source", "note"];
}

/// An article before it is embedded into a post file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub body: String,
    pub summary: String,
    pub used_model: bool,
}

/// Outcome of the pre-publish validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,
    pub issues: Vec<String>,
}

impl GateResult {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            passed: issues.is_empty(),
            issues,
        }
    }
}
