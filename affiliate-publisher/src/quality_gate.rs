use crate::drafting::rel_is_sponsored_nofollow;
use crate::types::GateResult;
use crate::utils::text::{strip_front_matter, visible_char_count};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_MAX_DUPLICATE_RATIO: f64 = 0.35;

/// Absolute-claim phrases (health and investment guarantees) that must not appear.
pub const DEFAULT_BANNED_PHRASES: &[&str] = &[
    "必ず治る",
    "絶対に治る",
    "100%儲かる",
    "元本保証",
    "確実に勝てる",
    "副作用はありません",
    "絶対に稼げる",
];

/// Japanese full stop and newline end a sentence.
pub const DEFAULT_SENTENCE_DELIMITERS: &[char] = &['。', '\n'];

static MARKDOWN_EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\(https?://[^\)]+\)").unwrap());
static EXTERNAL_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\s+([^>]*href="https?://[^"]+"[^>]*)>"#).unwrap());
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).unwrap());
static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"rel="([^"]+)""#).unwrap());

/// An outbound `<a>` tag: its target and its raw attribute string.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAnchor {
    pub href: String,
    pub attrs: String,
}

/// Pre-publish validation over a rendered post.
///
/// Locale-specific data (banned phrases, sentence delimiters) is held on the
/// gate rather than in the checks, with Japanese defaults.
#[derive(Debug, Clone)]
pub struct QualityGate {
    min_chars: usize,
    disclosure_text: String,
    max_duplicate_ratio: f64,
    banned_phrases: Vec<String>,
    sentence_delimiters: Vec<char>,
}

impl QualityGate {
    pub fn new(min_chars: usize, disclosure_text: impl Into<String>) -> Self {
        Self {
            min_chars,
            disclosure_text: disclosure_text.into(),
            max_duplicate_ratio: DEFAULT_MAX_DUPLICATE_RATIO,
            banned_phrases: DEFAULT_BANNED_PHRASES.iter().map(|p| p.to_string()).collect(),
            sentence_delimiters: DEFAULT_SENTENCE_DELIMITERS.to_vec(),
        }
    }

    pub fn with_max_duplicate_ratio(mut self, ratio: f64) -> Self {
        self.max_duplicate_ratio = ratio;
        self
    }

    pub fn with_banned_phrases(mut self, phrases: Vec<String>) -> Self {
        self.banned_phrases = phrases;
        self
    }

    pub fn with_sentence_delimiters(mut self, delimiters: Vec<char>) -> Self {
        self.sentence_delimiters = delimiters;
        self
    }

    /// Run every check and collect one issue per violation.
    pub fn check(&self, text: &str) -> GateResult {
        let mut issues = Vec::new();

        let chars = content_char_count(text);
        if chars < self.min_chars {
            issues.push(format!("body too short: {} < {} visible characters", chars, self.min_chars));
        }

        let ratio = duplicate_ratio(text, &self.sentence_delimiters);
        if ratio > self.max_duplicate_ratio {
            issues.push(format!(
                "duplicate sentence ratio too high: {:.2}% > {:.2}%",
                ratio * 100.0,
                self.max_duplicate_ratio * 100.0
            ));
        }

        for phrase in &self.banned_phrases {
            if text.contains(phrase.as_str()) {
                issues.push(format!("banned phrase found: {}", phrase));
            }
        }

        if !text.contains(&self.disclosure_text) {
            issues.push("disclosure text is missing from the post".to_string());
        }

        if MARKDOWN_EXTERNAL_LINK.is_match(text) {
            issues.push(
                "markdown external link found; outbound links must be HTML <a> tags with rel set"
                    .to_string(),
            );
        }

        let anchors = find_external_anchors(text);
        if anchors.is_empty() {
            issues.push("no outbound CTA link found".to_string());
        }
        for anchor in &anchors {
            let sponsored = REL_ATTR
                .captures(&anchor.attrs)
                .map(|caps| rel_is_sponsored_nofollow(&caps[1]))
                .unwrap_or(false);
            if !sponsored {
                issues.push(format!(
                    "outbound link ({}) is missing rel=\"sponsored nofollow\"",
                    anchor.href
                ));
            }
        }

        debug!("Quality gate found {} issues", issues.len());
        GateResult::from_issues(issues)
    }
}

/// Check `text` with the default Japanese rules.
pub fn run_quality_gate(
    text: &str,
    min_chars: usize,
    disclosure_text: &str,
    max_duplicate_ratio: f64,
) -> GateResult {
    QualityGate::new(min_chars, disclosure_text)
        .with_max_duplicate_ratio(max_duplicate_ratio)
        .check(text)
}

/// Visible characters after dropping a leading front-matter block.
pub fn content_char_count(text: &str) -> usize {
    visible_char_count(&strip_front_matter(text))
}

/// Share of sentences that repeat an earlier sentence.
///
/// A sentence seen `n` times contributes `n - 1` duplicates. Blank
/// sentences are ignored; text without sentences has ratio 0.
pub fn duplicate_ratio(text: &str, delimiters: &[char]) -> f64 {
    let sentences: Vec<&str> = text
        .split(|c: char| delimiters.contains(&c))
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect();
    if sentences.is_empty() {
        return 0.0;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for &sentence in &sentences {
        *seen.entry(sentence).or_insert(0) += 1;
    }
    let duplicates: usize = seen.values().filter(|&&count| count > 1).map(|count| count - 1).sum();

    duplicates as f64 / sentences.len() as f64
}

pub fn find_external_anchors(text: &str) -> Vec<ExternalAnchor> {
    EXTERNAL_ANCHOR
        .captures_iter(text)
        .map(|caps| {
            let attrs = caps[1].to_string();
            let href = HREF_ATTR
                .captures(&attrs)
                .map(|href| href[1].to_string())
                .unwrap_or_default();
            ExternalAnchor { href, attrs }
        })
        .collect()
}
