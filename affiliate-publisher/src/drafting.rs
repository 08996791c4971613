//! Article drafting: a deterministic template article, or a model-written
//! one when the configured provider is reachable and returns usable text.
//!
//! Drafting never fails. Every reason not to use the model is an explicit
//! [`FallbackReason`], and the outcome says which path produced the draft.

use crate::llm_adapter::{GenerationError, TextGenerator, HUGGINGFACE_PROVIDER};
use crate::types::ArticleDraft;
use crate::utils::text::{compact_spaces, take_chars, visible_char_count};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

pub const DEFAULT_TITLE_MAX_CHARS: usize = 48;
pub const MIN_CTA_BLOCKS: usize = 2;

static ANCHOR_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a\s+[^>]*>").unwrap());
static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"rel="([^"]*)""#).unwrap());

/// What to write about, for whom, and under which constraints.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub keyword: String,
    pub intent: String,
    pub tool_name: String,
    pub cta_url: String,
    pub disclosure_text: String,
    pub min_chars: usize,
    /// Calendar year stamped into titles
    pub year: i32,
}

/// How (and whether) to call the external generator.
#[derive(Debug, Clone, Default)]
pub struct GenerationSettings {
    pub provider: String,
    pub model: String,
    pub credential: Option<String>,
    pub force_template: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    ForcedTemplate,
    UnsupportedProvider(String),
    MissingCredential,
    CallFailed(String),
    ParseFailed(String),
    TooShort { chars: usize, min_chars: usize },
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForcedTemplate => write!(f, "template forced"),
            Self::UnsupportedProvider(provider) => write!(f, "unsupported provider '{}'", provider),
            Self::MissingCredential => write!(f, "no API credential configured"),
            Self::CallFailed(error) => write!(f, "generation call failed: {}", error),
            Self::ParseFailed(error) => write!(f, "generation response unusable: {}", error),
            Self::TooShort { chars, min_chars } => {
                write!(f, "generated body too short: {} < {}", chars, min_chars)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftOutcome {
    ModelGenerated(ArticleDraft),
    Fallback {
        draft: ArticleDraft,
        reason: FallbackReason,
    },
}

impl DraftOutcome {
    pub fn draft(&self) -> &ArticleDraft {
        match self {
            Self::ModelGenerated(draft) => draft,
            Self::Fallback { draft, .. } => draft,
        }
    }

    pub fn into_draft(self) -> ArticleDraft {
        match self {
            Self::ModelGenerated(draft) => draft,
            Self::Fallback { draft, .. } => draft,
        }
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Self::ModelGenerated(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Title hooks, picked by substring match on keyword and intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleHook {
    Comparison,
    Pricing,
    Beginner,
    CaseStudy,
    Checklist,
}

impl TitleHook {
    pub fn classify(keyword: &str, intent: &str) -> Self {
        if keyword.contains("比較") || intent.contains("比較") {
            Self::Comparison
        } else if keyword.contains("料金") || keyword.contains("費用") || intent.contains("料金") {
            Self::Pricing
        } else if keyword.contains("初心者") || intent.contains("初") {
            Self::Beginner
        } else if keyword.contains("活用") || keyword.contains("事例") {
            Self::CaseStudy
        } else {
            Self::Checklist
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Comparison => "比較ポイント5つ",
            Self::Pricing => "料金と失敗しない選び方",
            Self::Beginner => "初心者向け導入手順",
            Self::CaseStudy => "活用事例3選",
            Self::Checklist => "失敗しない導入チェックリスト",
        }
    }
}

/// Build a click-through oriented title no longer than `max_chars`.
///
/// Tries `【{year}年版】{keyword} {hook}｜{tool}`, then the same without the
/// tool suffix, then `title` itself if it mentions the keyword and fits,
/// and finally the year tag with a (possibly truncated) keyword.
pub fn optimize_title_for_ctr(
    title: &str,
    keyword: &str,
    intent: &str,
    tool_name: &str,
    year: i32,
    max_chars: usize,
) -> String {
    let keyword = compact_spaces(keyword);
    let intent = compact_spaces(intent);
    let current = compact_spaces(title);
    let hook = TitleHook::classify(&keyword, &intent).phrase();
    let fits = |candidate: &str| candidate.chars().count() <= max_chars;

    let candidate = format!("【{}年版】{} {}｜{}", year, keyword, hook, tool_name);
    if fits(&candidate) {
        return candidate;
    }

    let candidate = format!("【{}年版】{} {}", year, keyword, hook);
    if fits(&candidate) {
        return candidate;
    }

    if !current.is_empty() && current.contains(&keyword) && fits(&current) {
        return current;
    }

    let keyword = if keyword.chars().count() > max_chars.saturating_sub(9) {
        format!("{}…", take_chars(&keyword, max_chars.saturating_sub(10)))
    } else {
        keyword
    };
    format!("【{}年版】{}", year, keyword)
}

pub fn build_prompt(request: &DraftRequest) -> String {
    [
        "あなたは日本語SEOライターです。次の条件で記事を作成してください。".to_string(),
        format!("- キーワード: {}", request.keyword),
        format!("- 検索意図: {}", request.intent),
        format!("- 紹介ツール名: {}", request.tool_name),
        format!("- 最低文字数: {}文字", request.min_chars),
        "- 断定的な医療・投資助言は禁止".to_string(),
        "- 過剰な誇張表現は禁止".to_string(),
        format!("- 記事冒頭に次の広告表記文を自然に入れる: {}", request.disclosure_text),
        "- CTAはHTMLリンクで1つ以上含め、必ず rel=\"sponsored nofollow\" を設定する".to_string(),
        format!("- CTA URLは {}", request.cta_url),
        String::new(),
        "出力形式:".to_string(),
        "1行目: タイトル".to_string(),
        "2行目以降: 本文".to_string(),
    ]
    .join("\n")
}

pub fn cta_block(tool_name: &str, cta_url: &str) -> String {
    format!(
        r#"<p><a href="{}" rel="sponsored nofollow" target="_blank">{}の公式ページを見る</a></p>"#,
        cta_url, tool_name
    )
}

/// Whether a space-separated `rel` value carries both sponsorship tokens.
pub fn rel_is_sponsored_nofollow(rel: &str) -> bool {
    let tokens: Vec<String> = rel.split_whitespace().map(str::to_lowercase).collect();
    tokens.iter().any(|t| t == "sponsored") && tokens.iter().any(|t| t == "nofollow")
}

/// Number of anchors whose `rel` contains both `sponsored` and `nofollow`.
pub fn cta_count(text: &str) -> usize {
    ANCHOR_OPEN_TAG
        .find_iter(text)
        .filter(|tag| {
            REL_ATTR
                .captures(tag.as_str())
                .map(|caps| rel_is_sponsored_nofollow(&caps[1]))
                .unwrap_or(false)
        })
        .count()
}

/// Insert CTA blocks at paragraph index 2 (or the end of shorter bodies)
/// until `body` holds at least `min_count` sponsored anchors.
pub fn ensure_min_cta_blocks(body: &str, tool_name: &str, cta_url: &str, min_count: usize) -> String {
    let cta = cta_block(tool_name, cta_url);
    let mut paragraphs: Vec<String> = body
        .split("\n\n")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    if paragraphs.is_empty() {
        paragraphs.push(body.trim().to_string());
    }

    let mut existing = cta_count(&paragraphs.join("\n\n"));
    while existing < min_count {
        let position = paragraphs.len().min(2);
        paragraphs.insert(position, cta.clone());
        existing += 1;
    }
    paragraphs.join("\n\n")
}

fn summary_for(keyword: &str) -> String {
    format!("{}の導入判断で失敗しないための実務チェックポイントを整理。", keyword)
}

/// Deterministic template article, padded until it clears `min_chars + 80`
/// visible characters.
///
/// Padding repeats the same three supplements, so from about 3000 `min_chars`
/// the duplicate sentence check of the quality gate rejects the result.
pub fn fallback_article(request: &DraftRequest) -> ArticleDraft {
    let keyword = request.keyword.as_str();
    let intent = request.intent.as_str();
    let tool = request.tool_name.as_str();
    let cta = cta_block(tool, &request.cta_url);

    let title = optimize_title_for_ctr("", keyword, intent, tool, request.year, DEFAULT_TITLE_MAX_CHARS);

    let mut sections = vec![
        format!("{}。本記事では、{}を検討している方に向けて、{}を前提に導入までの流れを具体化します。AIツールは機能比較だけで判断すると失敗しやすいため、業務フロー、教育コスト、既存システムとの接続性、そして継続運用の観点を同時に評価することが重要です。", request.disclosure_text, keyword, intent),
        cta.clone(),
        format!("最初に確認すべきは、{}で何を短縮したいのかを一文で定義することです。たとえば『週次レポート作成の所要時間を半分にする』『問い合わせ一次回答を平日日中に5分以内で返す』のように、対象業務と数値を明確にすると、機能の過不足を定量比較できます。目的が曖昧なまま試すと、便利そうに見える機能へ時間を使い、効果測定が不能になります。", tool),
        "次に、入力データの品質を点検します。AIツールの成果は、モデル性能だけでなく、与えるコンテキストの正確性に依存します。命名規則が統一されていないファイル、更新履歴のないドキュメント、重複した顧客情報が混在している状態では、回答の一貫性が崩れます。導入前に『最新の正データはどこか』『更新責任者は誰か』を固定し、運用ルールを最小限で整えると、初期効果が出やすくなります。".to_string(),
        "費用評価では、月額料金だけでなく運用コストを含めて見積もるべきです。具体的には、管理者の監視時間、プロンプトの保守、チーム教育、障害時の代替フローを合算します。短期的には低価格プランが有利でも、制限で業務が分断されると結果的に高く付きます。反対に、必要最小限の機能で小さく始め、効果が確認できたら段階的に拡張する方式は失敗確率を下げます。".to_string(),
        "セキュリティ面では、機密情報の扱いポリシーを事前に定めてください。顧客個人情報、契約金額、未公開情報は入力禁止にし、匿名化や要約化を標準手順に組み込むと、事故リスクを大きく減らせます。また、監査ログの保存期間、アクセス権限、退職者アカウントの無効化を明文化しておくと、運用の再現性が上がります。".to_string(),
        "実装段階では、最初の2週間を検証期間として、毎週同じ指標を測定するのが有効です。推奨指標は、作業時間削減率、一次回答までの時間、出力の修正回数、担当者満足度です。数値が改善しない場合は、ツール変更より先に入力形式とプロンプトを見直すと改善余地が見つかりやすいです。".to_string(),
        format!("最後に、{}導入を成功させる鍵は『小さな成功体験を反復する運用設計』です。機能の多さではなく、現場で継続できる運用を優先してください。下記リンクから{}の現行仕様を確認し、まずは1つの業務に限定して試験導入するのが最短ルートです。", keyword, tool),
        cta,
    ];
    let supplements = [
        "実行テンプレートとして、初週は『現状工数の計測』『試験導入対象の1業務決定』『入力データ整備』『担当者レビュー』の4点に限定してください。対象を増やしすぎると、どこが改善したのか判定不能になります。週末に振り返るときは、削減時間だけでなく修正時間も記録すると、見かけ上の効率化を排除できます。".to_string(),
        format!("比較時の評価表は、価格、精度、学習負荷、連携性、監査性の5軸で作るのが実務的です。各軸を5点満点で評価し、導入目的に合わせて重みを付けると意思決定が速くなります。{}を候補にする場合も、他候補と同じ表で比較し、主観ではなく指標で選ぶことが重要です。", tool),
        format!("運用開始後は、毎週の定例で『使った機能』『使わなかった機能』『改善要望』を簡潔に収集し、次週の設定変更を1つだけ実施します。変更点を増やしすぎると因果が追えません。小さな改善を継続すると、チーム全体で{}の活用度が安定して上がります。", keyword),
    ];

    let target = request.min_chars + 80;
    while visible_char_count(&sections.join("\n\n")) < target {
        sections.extend(supplements.iter().cloned());
    }

    let body = ensure_min_cta_blocks(&sections.join("\n\n"), tool, &request.cta_url, MIN_CTA_BLOCKS);
    ArticleDraft {
        title,
        body,
        summary: summary_for(keyword),
        used_model: false,
    }
}

/// First non-blank line is the title; the rest, blank-line joined, is the body.
pub fn parse_model_output(raw_text: &str, fallback_title: &str) -> (String, String) {
    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match lines.split_first() {
        None => (fallback_title.to_string(), raw_text.to_string()),
        Some((title, [])) => (title.to_string(), raw_text.to_string()),
        Some((title, rest)) => (title.to_string(), rest.join("\n\n")),
    }
}

/// Produce a draft for `request`, calling `generator` only when `settings`
/// allow it. Any failure on the model path yields the template draft.
pub async fn generate_article(
    request: &DraftRequest,
    settings: &GenerationSettings,
    generator: &dyn TextGenerator,
) -> DraftOutcome {
    let fallback = |reason: FallbackReason| {
        match &reason {
            FallbackReason::CallFailed(_) | FallbackReason::ParseFailed(_) | FallbackReason::TooShort { .. } => {
                warn!("Using template article for '{}': {}", request.keyword, reason)
            }
            _ => info!("Using template article for '{}': {}", request.keyword, reason),
        }
        DraftOutcome::Fallback {
            draft: fallback_article(request),
            reason,
        }
    };

    if settings.force_template {
        return fallback(FallbackReason::ForcedTemplate);
    }
    if settings.provider != HUGGINGFACE_PROVIDER {
        return fallback(FallbackReason::UnsupportedProvider(settings.provider.clone()));
    }
    let credential = match settings.credential.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ => return fallback(FallbackReason::MissingCredential),
    };

    let prompt = build_prompt(request);
    let generated = match generator.generate(&settings.model, credential, &prompt).await {
        Ok(text) => text,
        Err(GenerationError::UnexpectedFormat(error)) => {
            return fallback(FallbackReason::ParseFailed(error));
        }
        Err(error) => return fallback(FallbackReason::CallFailed(error.to_string())),
    };

    let template_title = optimize_title_for_ctr(
        "",
        &request.keyword,
        &request.intent,
        &request.tool_name,
        request.year,
        DEFAULT_TITLE_MAX_CHARS,
    );
    let (raw_title, body) = parse_model_output(&generated, &template_title);
    let title = optimize_title_for_ctr(
        &raw_title,
        &request.keyword,
        &request.intent,
        &request.tool_name,
        request.year,
        DEFAULT_TITLE_MAX_CHARS,
    );

    let body = if body.contains(&request.disclosure_text) {
        body
    } else {
        format!("{}\n\n{}", request.disclosure_text, body)
    };
    let body = ensure_min_cta_blocks(&body, &request.tool_name, &request.cta_url, MIN_CTA_BLOCKS);

    let chars = visible_char_count(&body);
    if chars < request.min_chars {
        return fallback(FallbackReason::TooShort {
            chars,
            min_chars: request.min_chars,
        });
    }

    info!("Model generated article for '{}' ({} visible chars)", request.keyword, chars);
    DraftOutcome::ModelGenerated(ArticleDraft {
        title,
        body,
        summary: summary_for(&request.keyword),
        used_model: true,
    })
}
