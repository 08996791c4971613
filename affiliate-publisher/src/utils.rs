use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-]").unwrap());
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Turn free text into a URL-safe slug.
///
/// ASCII input is lowercased and reduced to `[a-z0-9-]`. Input with any
/// non-ASCII character (Japanese keywords, mostly) would lose almost all
/// of its content that way, so it is hashed instead: `kw-` followed by the
/// first 10 hex chars of the SHA-256 of the trimmed text.
pub fn slugify(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.is_ascii() {
        let digest = Sha256::digest(trimmed.as_bytes());
        let hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        return format!("kw-{}", &hex[..10]);
    }

    let value = trimmed.to_lowercase();
    let value = WHITESPACE_RUN.replace_all(&value, "-");
    let value = NON_SLUG_CHAR.replace_all(&value, "-");
    let value = DASH_RUN.replace_all(&value, "-");
    let value = value.trim_matches('-');
    if value.is_empty() {
        "post".to_string()
    } else {
        value.to_string()
    }
}

/// Text processing utilities
pub mod text {
    use regex::Regex;
    use std::sync::LazyLock;

    static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
    static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A---[\s\S]*?---\n").unwrap());
    static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

    /// Collapse whitespace runs into single spaces and trim.
    pub fn compact_spaces(text: &str) -> String {
        WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
    }

    /// Remove one leading `---` ... `---` block, if present.
    pub fn strip_front_matter(text: &str) -> String {
        FRONT_MATTER.replacen(text, 1, "").into_owned()
    }

    /// Characters a reader sees: markup tags and all whitespace removed.
    pub fn visible_char_count(text: &str) -> usize {
        MARKUP_TAG
            .replace_all(text, "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .count()
    }

    /// First `max` characters of `text`, counted in chars rather than bytes.
    pub fn take_chars(text: &str, max: usize) -> String {
        text.chars().take(max).collect()
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

    const JST_OFFSET_SECONDS: i32 = 9 * 3600;

    pub fn jst() -> FixedOffset {
        FixedOffset::east_opt(JST_OFFSET_SECONDS).expect("JST offset is within range")
    }

    /// The instant every run is anchored to. Only the CLI calls this.
    pub fn jst_now() -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&jst())
    }

    pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
    }

    /// Parse an ISO date, treating blank or malformed values as 1970-01-01.
    pub fn parse_date_or_epoch(value: &str) -> NaiveDate {
        // NaiveDate::default() is the unix epoch
        parse_iso_date(value).unwrap_or_default()
    }

    /// Whether `day` falls in `month`, formatted `YYYY-MM`.
    pub fn within_month(day: NaiveDate, month: &str) -> bool {
        let Some((year, month)) = month.split_once('-') else {
            return false;
        };
        match (year.trim().parse::<i32>(), month.trim().parse::<u32>()) {
            (Ok(year), Ok(month)) => day.year() == year && day.month() == month,
            _ => false,
        }
    }

    pub fn month_key(day: NaiveDate) -> String {
        format!("{}-{:02}", day.year(), day.month())
    }

    /// Last calendar day of the month containing `day`.
    pub fn month_end(day: NaiveDate) -> NaiveDate {
        let (year, month) = if day.month() == 12 {
            (day.year() + 1, 1)
        } else {
            (day.year(), day.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(day)
    }
}
