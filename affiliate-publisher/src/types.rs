use std::path::PathBuf;

// Use the interfaces crate for core row types
pub use interfaces::defs::{
    AdRevenueRow, ArticleDraft, CostRow, CsvRecord, GateResult, MetricsRow, ToolRow, ToolStatus,
    TopicRow, TopicStatus,
};
pub use interfaces::state::RowStore;

/// Skip outcomes of a publish run; these are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTopicAvailable,
    NoToolAvailable,
    BudgetLimitEvenDayOnly,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoTopicAvailable => "no_topic_available",
            Self::NoToolAvailable => "no_tool_available",
            Self::BudgetLimitEvenDayOnly => "budget_limit_even_day_only",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Missing required config keys: {}", missing.join(", "))]
    Config { missing: Vec<String> },

    #[error("{} is missing required columns: {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("tool '{tool}' has no usable URL")]
    NoUsableUrl { tool: String },

    #[error("Quality gate failed: {}", issues.join(" | "))]
    QualityGate { issues: Vec<String> },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, PublisherError>;
