//! System configuration loaded from `config/system.yaml`.
//!
//! Required keys are checked against the raw YAML tree first so that a
//! single error can name every missing key; only then is the tree
//! deserialized into typed sections.

use crate::types::{PublisherError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const REQUIRED_KEYS: &[(&str, &str)] = &[
    ("content", "min_chars"),
    ("content", "posts_per_run"),
    ("generation", "provider"),
    ("generation", "model"),
    ("affiliate", "disclosure_text"),
    ("affiliate", "default_epc_usd"),
];

pub const DEFAULT_GENERATION_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub site: SiteConfig,
    pub content: ContentConfig,
    pub generation: GenerationConfig,
    pub affiliate: AffiliateConfig,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    pub title: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub min_chars: usize,
    pub posts_per_run: i64,
    pub language: Option<String>,
}

impl ContentConfig {
    /// Configured posts per run, never less than one.
    pub fn posts_per_run(&self) -> usize {
        self.posts_per_run.max(1) as usize
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub provider: String,
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AffiliateConfig {
    pub disclosure_text: String,
    pub default_epc_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_max_monthly_usd")]
    pub max_monthly_usd: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            max_monthly_usd: default_max_monthly_usd(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrowthConfig {
    #[serde(default = "default_min_keyword_pool")]
    pub min_keyword_pool: usize,
    #[serde(default = "default_keyword_add_limit")]
    pub keyword_add_limit: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            min_keyword_pool: default_min_keyword_pool(),
            keyword_add_limit: default_keyword_add_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_ad_revenue_csv")]
    pub ad_revenue_csv: PathBuf,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            ad_revenue_csv: default_ad_revenue_csv(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_endpoint() -> String {
    DEFAULT_GENERATION_ENDPOINT.to_string()
}

fn default_max_monthly_usd() -> f64 {
    5.0
}

fn default_min_keyword_pool() -> usize {
    80
}

fn default_keyword_add_limit() -> usize {
    40
}

fn default_ad_revenue_csv() -> PathBuf {
    PathBuf::from("data/ad_revenue.csv")
}

impl SystemConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading system config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Endpoint and timeout for ad hoc generation. A missing file gives the
    /// defaults; a file that fails to load is an error.
    pub fn generation_endpoint(path: impl AsRef<Path>) -> Result<(String, u64)> {
        let path = path.as_ref();
        if !path.exists() {
            info!("{} not found, using the default endpoint", path.display());
            return Ok((default_endpoint(), default_timeout_seconds()));
        }
        let config = Self::load(path)?;
        Ok((config.generation.endpoint, config.generation.timeout_seconds))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let tree: serde_yaml::Value = serde_yaml::from_str(raw)?;
        let missing = missing_required_keys(&tree);
        if !missing.is_empty() {
            return Err(PublisherError::Config { missing });
        }
        Ok(serde_yaml::from_value(tree)?)
    }
}

/// Dotted names of every required key absent from `tree`.
pub fn missing_required_keys(tree: &serde_yaml::Value) -> Vec<String> {
    REQUIRED_KEYS
        .iter()
        .filter(|(section, key)| {
            tree.get(*section)
                .and_then(|section| section.get(*key))
                .is_none()
        })
        .map(|(section, key)| format!("{}.{}", section, key))
        .collect()
}
