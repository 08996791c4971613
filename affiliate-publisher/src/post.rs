use crate::types::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered post: front-matter fields plus body.
#[derive(Debug, Clone)]
pub struct PostDocument {
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub slug: String,
    pub keyword: String,
    pub intent: String,
    pub tool_id: String,
    pub tool_name: String,
    pub cta_url: String,
    pub body: String,
}

/// Front-matter values are only escaped for embedded double quotes.
fn yaml_escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

impl PostDocument {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("---\n");
        out.push_str("layout: post\n");
        out.push_str(&format!("title: \"{}\"\n", yaml_escape(&self.title)));
        out.push_str(&format!(
            "date: {}\n",
            self.date.to_rfc3339_opts(SecondsFormat::Secs, false)
        ));
        out.push_str(&format!("permalink: /posts/{}/\n", self.slug));
        out.push_str("autogen_post: true\n");
        out.push_str(&format!("keyword: \"{}\"\n", yaml_escape(&self.keyword)));
        out.push_str(&format!("intent: \"{}\"\n", yaml_escape(&self.intent)));
        out.push_str(&format!("tool_id: \"{}\"\n", yaml_escape(&self.tool_id)));
        out.push_str(&format!("tool_name: \"{}\"\n", yaml_escape(&self.tool_name)));
        out.push_str(&format!("cta_url: \"{}\"\n", yaml_escape(&self.cta_url)));
        out.push_str("---\n\n");
        out.push_str(self.body.trim());
        out.push('\n');
        out
    }
}

pub fn post_file_stem(date_prefix: &str, slug: &str) -> String {
    format!("{}-{}", date_prefix, slug)
}

pub fn post_path(posts_dir: &Path, date_prefix: &str, slug: &str) -> PathBuf {
    posts_dir.join(format!("{}.md", post_file_stem(date_prefix, slug)))
}

/// Every post file stem issued so far: those on disk when the run started
/// plus those reserved during the run.
#[derive(Debug, Clone, Default)]
pub struct SlugRegistry {
    taken: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the stems of `*.md` files in `posts_dir`. A missing
    /// directory has no posts.
    pub fn from_dir(posts_dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        if !posts_dir.is_dir() {
            return Ok(registry);
        }

        for entry in std::fs::read_dir(posts_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                registry.taken.insert(stem.to_string());
            }
        }

        debug!("Seeded slug registry with {} existing posts", registry.taken.len());
        Ok(registry)
    }

    pub fn is_taken(&self, stem: &str) -> bool {
        self.taken.contains(stem)
    }

    /// Reserve the first free slug among `base`, `base-2`, `base-3`, ...
    pub fn reserve(&mut self, base_slug: &str, date_prefix: &str) -> String {
        let mut candidate = base_slug.to_string();
        let mut suffix = 2;
        while self.is_taken(&post_file_stem(date_prefix, &candidate)) {
            debug!("Slug {} already taken for {}", candidate, date_prefix);
            candidate = format!("{}-{}", base_slug, suffix);
            suffix += 1;
        }
        self.taken.insert(post_file_stem(date_prefix, &candidate));
        candidate
    }
}

/// One-off unique slug against the posts already in `posts_dir`.
pub fn generate_unique_slug(base_slug: &str, posts_dir: &Path, date_prefix: &str) -> Result<String> {
    let mut registry = SlugRegistry::from_dir(posts_dir)?;
    Ok(registry.reserve(base_slug, date_prefix))
}
