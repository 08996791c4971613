use affiliate_publisher::drafting::{generate_article, DraftRequest, GenerationSettings};
use affiliate_publisher::pipeline::{PublishSettings, PublisherBuilder};
use affiliate_publisher::reports::ad_revenue::validate_ad_revenue;
use affiliate_publisher::reports::audit::{DEFAULT_TARGET_DAILY_USD, DEFAULT_WINDOW_DAYS};
use affiliate_publisher::reports::{
    read_ad_revenue_rows, refresh_keyword_pool, sum_ad_revenue, sum_traffic, weekly_window,
    MonetizationAudit, WeeklyReport,
};
use affiliate_publisher::utils::time::jst_now;
use affiliate_publisher::{
    mark_topic_used, select_topic, CostRow, CsvStore, HuggingFaceGenerator, MetricsRow,
    QualityGate, RowStore, SystemConfig, ToolRow, TopicRow,
};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "affiliate-publisher")]
#[command(about = "Publishes affiliate blog posts from keyword and tool catalogs")]
struct Cli {
    /// Path to the system configuration file
    #[arg(long, global = true, default_value = "config/system.yaml")]
    config: PathBuf,

    /// Keyword store
    #[arg(long, global = true, default_value = "data/keywords.csv")]
    keywords: PathBuf,

    /// Tool store
    #[arg(long, global = true, default_value = "data/tools.csv")]
    tools: PathBuf,

    /// Hugging Face credential for model drafting
    #[arg(long, global = true, env = "HUGGINGFACE_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one publish batch
    Publish {
        #[arg(long, default_value = "data/costs.csv")]
        costs: PathBuf,
        #[arg(long, default_value = "content/posts")]
        posts_dir: PathBuf,
        /// Build and gate posts without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Skip the model and use the template article
        #[arg(long)]
        mock: bool,
    },
    /// Print the next topic, optionally marking it used
    SelectTopic {
        #[arg(long)]
        mark_used: bool,
    },
    /// Draft one article and print it
    Generate {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        intent: String,
        #[arg(long)]
        tool_name: String,
        #[arg(long)]
        cta_url: String,
        #[arg(long)]
        disclosure_text: String,
        #[arg(long, default_value_t = 1400)]
        min_chars: usize,
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "huggingface_free")]
        provider: String,
        #[arg(long)]
        force_template: bool,
    },
    /// Check a post file against the quality gate; exits 1 on failure
    Gate {
        #[arg(long)]
        file: PathBuf,
    },
    /// Seed new keywords when the active pool runs low
    RefreshKeywords {
        #[arg(long)]
        min_pool: Option<usize>,
        #[arg(long)]
        max_add: Option<usize>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Report affiliate readiness and recent traffic economics
    Audit {
        #[arg(long, default_value = "data/analytics_metrics.csv")]
        metrics: PathBuf,
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: i64,
        #[arg(long, default_value_t = DEFAULT_TARGET_DAILY_USD)]
        target_daily_usd: f64,
    },
    /// Write the weekly revenue report
    WeeklyReport {
        #[arg(long, default_value = "data/analytics_metrics.csv")]
        metrics: PathBuf,
        /// Overrides reporting.ad_revenue_csv
        #[arg(long)]
        ad_revenue: Option<PathBuf>,
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,
    },
    /// Validate the manual AdSense revenue file
    ValidateAdRevenue {
        #[arg(long, default_value = "data/ad_revenue.csv")]
        file: PathBuf,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let now = jst_now();

    match cli.command {
        Command::Publish {
            costs,
            posts_dir,
            dry_run,
            mock,
        } => {
            let config = SystemConfig::load(&cli.config)?;
            info!("Publishing up to {} posts", config.content.posts_per_run());

            let cost_rows = CsvStore::<CostRow>::new(costs).load_optional()?;
            let generator = HuggingFaceGenerator::new(
                config.generation.endpoint.clone(),
                config.generation.timeout_seconds,
            )?;
            let settings = PublishSettings::from_config(&config, cli.hf_token, mock, posts_dir, dry_run);

            let publisher = PublisherBuilder::new(settings)
                .topics(Box::new(CsvStore::<TopicRow>::new(cli.keywords)))
                .tools(Box::new(CsvStore::<ToolRow>::new(cli.tools)))
                .cost_rows(cost_rows)
                .generator(Box::new(generator))
                .build()?;

            let outcome = publisher.run(now).await?;
            print_json(&outcome)?;
        }
        Command::SelectTopic { mark_used } => {
            let store = CsvStore::<TopicRow>::new(cli.keywords);
            let rows = store.load()?;
            let Some(selected) = select_topic(&rows).cloned() else {
                print_json(&json!({ "selected": null, "reason": "no_available_keywords" }))?;
                return Ok(ExitCode::SUCCESS);
            };
            if mark_used {
                store.save(&mark_topic_used(&rows, &selected.keyword, now))?;
            }
            print_json(&json!({ "selected": selected }))?;
        }
        Command::Generate {
            keyword,
            intent,
            tool_name,
            cta_url,
            disclosure_text,
            min_chars,
            model,
            provider,
            force_template,
        } => {
            let request = DraftRequest {
                keyword,
                intent,
                tool_name,
                cta_url,
                disclosure_text,
                min_chars,
                year: now.year(),
            };
            let settings = GenerationSettings {
                provider,
                model,
                credential: cli.hf_token,
                force_template,
            };
            let (endpoint, timeout) = SystemConfig::generation_endpoint(&cli.config)?;
            let generator = HuggingFaceGenerator::new(endpoint, timeout)?;
            let draft = generate_article(&request, &settings, &generator).await.into_draft();
            print_json(&json!({
                "title": draft.title,
                "summary": draft.summary,
                "body": draft.body,
                "used_model": draft.used_model,
            }))?;
        }
        Command::Gate { file } => {
            let config = SystemConfig::load(&cli.config)?;
            let text = std::fs::read_to_string(&file)?;
            let result = QualityGate::new(config.content.min_chars, config.affiliate.disclosure_text).check(&text);
            print_json(&result)?;
            if !result.passed {
                return Ok(ExitCode::from(1));
            }
        }
        Command::RefreshKeywords {
            min_pool,
            max_add,
            dry_run,
        } => {
            let config = SystemConfig::load(&cli.config)?;
            let keyword_store = CsvStore::<TopicRow>::new(cli.keywords);
            let keywords = keyword_store.load()?;
            let tools = CsvStore::<ToolRow>::new(cli.tools).load()?;

            let refresh = refresh_keyword_pool(
                &keywords,
                &tools,
                min_pool.unwrap_or(config.growth.min_keyword_pool),
                max_add.unwrap_or(config.growth.keyword_add_limit),
            );
            if !refresh.additions.is_empty() && !dry_run {
                keyword_store.save(&refresh.merged(&keywords))?;
            }
            print_json(&refresh)?;
        }
        Command::Audit {
            metrics,
            window_days,
            target_daily_usd,
        } => {
            let config = SystemConfig::load(&cli.config)?;
            let tools = CsvStore::<ToolRow>::new(cli.tools).load()?;
            let metrics = CsvStore::<MetricsRow>::new(metrics).load_optional()?;
            let audit = MonetizationAudit::build(
                &tools,
                &metrics,
                now.date_naive(),
                window_days,
                config.affiliate.default_epc_usd,
                target_daily_usd,
            );
            print_json(&audit)?;
        }
        Command::WeeklyReport {
            metrics,
            ad_revenue,
            reports_dir,
        } => {
            let config = SystemConfig::load(&cli.config)?;
            let (start_day, end_day) = weekly_window(now.date_naive());
            let metrics_rows = CsvStore::<MetricsRow>::new(&metrics).load_optional()?;
            let ad_revenue_path = ad_revenue.unwrap_or_else(|| config.reporting.ad_revenue_csv.clone());
            let ad_rows = read_ad_revenue_rows(&ad_revenue_path)?;

            let report = WeeklyReport {
                start_day,
                end_day,
                traffic: sum_traffic(&metrics_rows, start_day, end_day),
                default_epc_usd: config.affiliate.default_epc_usd,
                adsense_revenue_usd: sum_ad_revenue(&ad_rows, start_day, end_day)?,
                traffic_source: metrics.display().to_string(),
                adsense_source: ad_revenue_path.display().to_string(),
            };
            let path = report.write(&reports_dir)?;
            print_json(&report.summary(&path))?;
        }
        Command::ValidateAdRevenue { file } => {
            print_json(&validate_ad_revenue(&file)?)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
