use crate::config::SystemConfig;
use crate::drafting::{generate_article, DraftRequest, GenerationSettings};
use crate::llm_adapter::TextGenerator;
use crate::post::{post_path, PostDocument, SlugRegistry};
use crate::quality_gate::QualityGate;
use crate::tool::{mark_tool_posted, resolve_cta_url, select_tool};
use crate::topic::{mark_topic_used, select_topic};
use crate::types::{CostRow, PublisherError, Result, RowStore, SkipReason, ToolRow, TopicRow};
use crate::utils::slugify;
use crate::utils::time::{month_end, month_key, within_month};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type TopicStore = Box<dyn RowStore<TopicRow, Error = PublisherError>>;
pub type ToolStore = Box<dyn RowStore<ToolRow, Error = PublisherError>>;

/// Everything a publish run needs besides its stores.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub min_chars: usize,
    pub posts_per_run: usize,
    pub disclosure_text: String,
    pub max_monthly_usd: f64,
    pub generation: GenerationSettings,
    pub posts_dir: PathBuf,
    pub dry_run: bool,
}

impl PublishSettings {
    pub fn from_config(
        config: &SystemConfig,
        credential: Option<String>,
        force_template: bool,
        posts_dir: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            min_chars: config.content.min_chars,
            posts_per_run: config.content.posts_per_run(),
            disclosure_text: config.affiliate.disclosure_text.clone(),
            max_monthly_usd: config.cost.max_monthly_usd,
            generation: GenerationSettings {
                provider: config.generation.provider.clone(),
                model: config.generation.model.clone(),
                credential,
                force_template,
            },
            posts_dir,
            dry_run,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedPost {
    pub output: String,
    pub title: String,
    pub keyword: String,
    pub tool: String,
    pub cta_url: String,
    pub used_model: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub skipped: bool,
    pub run_id: Uuid,
    pub dry_run: bool,
    pub count: usize,
    pub posts: Vec<PublishedPost>,
    pub month_end: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkipReport {
    pub skipped: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
}

impl SkipReport {
    fn new(reason: SkipReason) -> Self {
        Self {
            skipped: true,
            reason: reason.code().to_string(),
            today: None,
            month: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Published(PublishReport),
    Skipped(SkipReport),
}

impl RunOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Sum of `total_usd` over cost rows for the month containing `today`.
/// Unparsable amounts are ignored; blank counts as zero.
pub fn current_month_spend(today: NaiveDate, cost_rows: &[CostRow]) -> f64 {
    cost_rows
        .iter()
        .filter(|row| within_month(today, &row.month))
        .filter_map(|row| {
            let amount = row.total_usd.trim();
            if amount.is_empty() {
                Some(0.0)
            } else {
                amount.parse::<f64>().ok()
            }
        })
        .sum()
}

/// Over budget throttles publishing to even days of the month; it does not
/// stop it.
pub fn should_skip_for_budget(today: NaiveDate, cost_rows: &[CostRow], max_monthly_usd: f64) -> bool {
    if current_month_spend(today, cost_rows) <= max_monthly_usd {
        return false;
    }
    today.day() % 2 == 1
}

/// Composes selection, drafting, gating and persistence for one run.
pub struct Publisher {
    settings: PublishSettings,
    topics: TopicStore,
    tools: ToolStore,
    cost_rows: Vec<CostRow>,
    generator: Box<dyn TextGenerator>,
}

struct PendingPost {
    path: PathBuf,
    markdown: String,
}

impl Publisher {
    /// Run up to `posts_per_run` iterations anchored at `now`.
    ///
    /// Post files and store updates are held in memory until every
    /// iteration has passed the quality gate; a failing gate aborts the
    /// run with nothing written. A failed write or store save leaves no
    /// post files behind.
    pub async fn run(&self, now: DateTime<FixedOffset>) -> Result<RunOutcome> {
        let today = now.date_naive();
        let mut topics = self.topics.load()?;
        let original_topics = topics.clone();
        let mut tools = self.tools.load()?;

        if should_skip_for_budget(today, &self.cost_rows, self.settings.max_monthly_usd) {
            info!(
                "Monthly spend above ${:.2} and {} is an odd day, skipping run",
                self.settings.max_monthly_usd, today
            );
            let mut report = SkipReport::new(SkipReason::BudgetLimitEvenDayOnly);
            report.today = Some(today.format("%Y-%m-%d").to_string());
            report.month = Some(month_key(today));
            return Ok(RunOutcome::Skipped(report));
        }

        let gate = QualityGate::new(self.settings.min_chars, self.settings.disclosure_text.clone());
        let mut slugs = SlugRegistry::from_dir(&self.settings.posts_dir)?;
        let mut used_tool_ids: HashSet<String> = HashSet::new();
        let mut pending: Vec<PendingPost> = Vec::new();
        let mut posts: Vec<PublishedPost> = Vec::new();
        let mut exhausted = SkipReason::NoTopicAvailable;

        for index in 0..self.settings.posts_per_run {
            let stamp = now + Duration::minutes(index as i64);

            let Some(topic) = select_topic(&topics).cloned() else {
                debug!("No topic available after {} posts", posts.len());
                exhausted = SkipReason::NoTopicAvailable;
                break;
            };
            if tools.is_empty() {
                exhausted = SkipReason::NoToolAvailable;
                break;
            }
            let tool = select_tool(&tools, &used_tool_ids)?.clone();
            used_tool_ids.insert(tool.tool_id.clone());
            let cta_url = resolve_cta_url(&tool)?;

            info!("Drafting '{}' with tool {}", topic.keyword, tool.name);
            let request = DraftRequest {
                keyword: topic.keyword.clone(),
                intent: topic.intent.clone(),
                tool_name: tool.name.clone(),
                cta_url: cta_url.clone(),
                disclosure_text: self.settings.disclosure_text.clone(),
                min_chars: self.settings.min_chars,
                year: stamp.year(),
            };
            let outcome =
                generate_article(&request, &self.settings.generation, self.generator.as_ref()).await;
            let fallback_reason = outcome.fallback_reason().map(|reason| reason.to_string());
            let draft = outcome.into_draft();

            let date_prefix = stamp.date_naive().format("%Y-%m-%d").to_string();
            let base_slug = slugify(&format!("{}-{}", topic.keyword, tool.name));
            let slug = slugs.reserve(&base_slug, &date_prefix);

            let document = PostDocument {
                title: draft.title.clone(),
                date: stamp,
                slug: slug.clone(),
                keyword: topic.keyword.clone(),
                intent: topic.intent.clone(),
                tool_id: tool.tool_id.clone(),
                tool_name: tool.name.clone(),
                cta_url: cta_url.clone(),
                body: draft.body.clone(),
            };
            let markdown = document.render();

            let result = gate.check(&markdown);
            if !result.passed {
                return Err(PublisherError::QualityGate {
                    issues: result.issues,
                });
            }

            let path = post_path(&self.settings.posts_dir, &date_prefix, &slug);
            posts.push(PublishedPost {
                output: path.display().to_string(),
                title: draft.title,
                keyword: topic.keyword.clone(),
                tool: tool.name.clone(),
                cta_url,
                used_model: draft.used_model,
                fallback_reason,
            });
            pending.push(PendingPost { path, markdown });

            topics = mark_topic_used(&topics, &topic.keyword, stamp);
            tools = mark_tool_posted(&tools, &tool.tool_id, stamp);
        }

        if posts.is_empty() {
            info!("Nothing to publish: {}", exhausted);
            return Ok(RunOutcome::Skipped(SkipReport::new(exhausted)));
        }

        if !self.settings.dry_run {
            self.persist(&pending, &topics, &tools, &original_topics)?;
        } else {
            info!("Dry run, {} posts not written", posts.len());
        }

        Ok(RunOutcome::Published(PublishReport {
            skipped: false,
            run_id: Uuid::new_v4(),
            dry_run: self.settings.dry_run,
            count: posts.len(),
            posts,
            month_end: month_end(today).format("%Y-%m-%d").to_string(),
        }))
    }

    /// Stage posts as `.md.tmp`, save both stores, then move the posts into
    /// place. On failure the staged files are removed and a topic store
    /// saved ahead of a failed tool save is written back.
    fn persist(
        &self,
        pending: &[PendingPost],
        topics: &[TopicRow],
        tools: &[ToolRow],
        original_topics: &[TopicRow],
    ) -> Result<()> {
        std::fs::create_dir_all(&self.settings.posts_dir)?;
        let mut staged: Vec<PathBuf> = Vec::with_capacity(pending.len());
        let result = self.commit(pending, &mut staged, topics, tools, original_topics);
        if result.is_err() {
            for path in staged.iter().filter(|path| path.exists()) {
                if let Err(err) = std::fs::remove_file(path) {
                    warn!("Could not remove staged post {}: {}", path.display(), err);
                }
            }
        }
        result
    }

    fn commit(
        &self,
        pending: &[PendingPost],
        staged: &mut Vec<PathBuf>,
        topics: &[TopicRow],
        tools: &[ToolRow],
        original_topics: &[TopicRow],
    ) -> Result<()> {
        for post in pending {
            let tmp = post.path.with_extension("md.tmp");
            std::fs::write(&tmp, &post.markdown)?;
            staged.push(tmp);
        }

        self.topics.save(topics)?;
        if let Err(err) = self.tools.save(tools) {
            if let Err(restore) = self.topics.save(original_topics) {
                warn!("Could not restore topic store after failed tool save: {}", restore);
            }
            return Err(err);
        }

        for (post, tmp) in pending.iter().zip(staged.iter()) {
            std::fs::rename(tmp, &post.path)?;
            info!("Wrote {}", post.path.display());
        }
        Ok(())
    }
}

/// Builder for wiring a [`Publisher`]'s stores and collaborators
pub struct PublisherBuilder {
    settings: PublishSettings,
    topics: Option<TopicStore>,
    tools: Option<ToolStore>,
    cost_rows: Vec<CostRow>,
    generator: Option<Box<dyn TextGenerator>>,
}

impl PublisherBuilder {
    pub fn new(settings: PublishSettings) -> Self {
        Self {
            settings,
            topics: None,
            tools: None,
            cost_rows: Vec::new(),
            generator: None,
        }
    }

    pub fn topics(mut self, store: TopicStore) -> Self {
        self.topics = Some(store);
        self
    }

    pub fn tools(mut self, store: ToolStore) -> Self {
        self.tools = Some(store);
        self
    }

    pub fn cost_rows(mut self, rows: Vec<CostRow>) -> Self {
        self.cost_rows = rows;
        self
    }

    pub fn generator(mut self, generator: Box<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn build(self) -> Result<Publisher> {
        let topics = self
            .topics
            .ok_or_else(|| PublisherError::General("topic store not configured".to_string()))?;
        let tools = self
            .tools
            .ok_or_else(|| PublisherError::General("tool store not configured".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| PublisherError::General("text generator not configured".to_string()))?;

        Ok(Publisher {
            settings: self.settings,
            topics,
            tools,
            cost_rows: self.cost_rows,
            generator,
        })
    }
}
