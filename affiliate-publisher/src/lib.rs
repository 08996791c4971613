pub mod types;
pub mod utils;
pub mod config;
pub mod store;
pub mod topic;
pub mod tool;
pub mod llm_adapter;
pub mod drafting;
pub mod quality_gate;
pub mod post;
pub mod pipeline;
pub mod reports;

pub use types::*;
pub use config::SystemConfig;
pub use store::CsvStore;
pub use topic::{mark_topic_used, select_topic};
pub use tool::{mark_tool_posted, resolve_cta_url, select_tool};
pub use llm_adapter::{GenerationError, HuggingFaceGenerator, MockGenerator, TextGenerator};
pub use drafting::{generate_article, DraftOutcome, DraftRequest, FallbackReason, GenerationSettings};
pub use quality_gate::{run_quality_gate, QualityGate};
pub use post::{generate_unique_slug, PostDocument, SlugRegistry};
pub use pipeline::{PublishSettings, Publisher, PublisherBuilder, RunOutcome};
