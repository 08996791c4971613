use affiliate_publisher::drafting::{
    cta_count, ensure_min_cta_blocks, fallback_article, optimize_title_for_ctr, parse_model_output,
    TitleHook, DEFAULT_TITLE_MAX_CHARS,
};
use affiliate_publisher::utils::text::visible_char_count;
use affiliate_publisher::{
    generate_article, DraftOutcome, DraftRequest, FallbackReason, GenerationSettings, MockGenerator,
    QualityGate, TextGenerator,
};
use tracing::info;

const DISCLOSURE: &str = "本記事には広告・アフィリエイトリンクが含まれます";

fn request() -> DraftRequest {
    DraftRequest {
        keyword: "AI導入".to_string(),
        intent: "比較したい".to_string(),
        tool_name: "Notion AI".to_string(),
        cta_url: "https://aff.test/notion".to_string(),
        disclosure_text: DISCLOSURE.to_string(),
        min_chars: 1400,
        year: 2026,
    }
}

fn model_settings() -> GenerationSettings {
    GenerationSettings {
        provider: "huggingface_free".to_string(),
        model: "Qwen/Qwen2.5-7B-Instruct".to_string(),
        credential: Some("hf_test".to_string()),
        force_template: false,
    }
}

fn long_model_output() -> String {
    let paragraphs: Vec<String> = (0..50)
        .map(|index| format!("段落{}では、導入前に確認すべき観点を具体的な手順とともに説明します。", index))
        .collect();
    format!("AI導入の進め方ガイド\n{}", paragraphs.join("\n\n"))
}

#[tokio::test]
async fn test_fallback_article_meets_length_and_cta_rules() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let draft = fallback_article(&request());
    info!("Fallback title: {}", draft.title);

    assert!(!draft.used_model);
    assert!(draft.body.contains(DISCLOSURE));
    assert!(cta_count(&draft.body) >= 2);
    assert!(visible_char_count(&draft.body) >= 1400 + 80);
    assert!(draft.title.contains("AI導入"));
    assert!(draft.title.chars().count() <= DEFAULT_TITLE_MAX_CHARS);

    let gate = QualityGate::new(1400, DISCLOSURE).check(&draft.body);
    assert!(gate.passed, "template failed the gate: {:?}", gate.issues);
}

#[test]
fn test_fallback_article_padding_repeats_at_large_min_chars() {
    let request = DraftRequest {
        min_chars: 3000,
        ..request()
    };
    let draft = fallback_article(&request);
    assert!(visible_char_count(&draft.body) >= 3000 + 80);

    let gate = QualityGate::new(3000, DISCLOSURE).check(&draft.body);
    assert!(gate
        .issues
        .iter()
        .any(|issue| issue.starts_with("duplicate sentence ratio too high")));
}

#[test]
fn test_fallback_article_is_deterministic() {
    assert_eq!(fallback_article(&request()), fallback_article(&request()));
}

#[test]
fn test_title_hooks_and_budget() {
    assert_eq!(TitleHook::classify("Canva 料金", ""), TitleHook::Pricing);
    assert_eq!(TitleHook::classify("AI議事録", "初めて使う"), TitleHook::Beginner);
    assert_eq!(TitleHook::classify("Canva 活用 事例", ""), TitleHook::CaseStudy);
    assert_eq!(TitleHook::classify("Canva", "導入"), TitleHook::Checklist);

    let title = optimize_title_for_ctr("", "AI導入", "比較したい", "Notion AI", 2026, 48);
    assert_eq!(title, "【2026年版】AI導入 比較ポイント5つ｜Notion AI");

    let long_keyword = "とても長いキーワード".repeat(6);
    let title = optimize_title_for_ctr("", &long_keyword, "", "Tool", 2026, 48);
    assert!(title.starts_with("【2026年版】"));
    assert!(title.ends_with('…'));
    assert!(title.chars().count() <= 48);
}

#[test]
fn test_title_falls_back_to_fitting_model_title() {
    let keyword = "業務効率化の進め方".repeat(3);
    let model_title = format!("{}入門", keyword);
    let title = optimize_title_for_ctr(&model_title, &keyword, "", "Tool", 2026, 40);
    assert_eq!(title, model_title);

    // A model title of exactly max_chars still fits
    let keyword = "業務効率化 ツール 比較 検討 チーム 導入 手順 ポイント まとめ";
    let exact = format!("{}の完全ガイド", keyword);
    assert_eq!(exact.chars().count(), 40);
    assert_eq!(optimize_title_for_ctr(&exact, keyword, "", "Tool", 2026, 40), exact);

    // Neither template nor model title fits: year tag plus truncated keyword
    let title = optimize_title_for_ctr(&format!("{}の完全ガイド（保存版）", keyword), keyword, "", "Tool", 2026, 40);
    assert!(title.starts_with("【2026年版】業務効率化"));
    assert!(title.ends_with('…'));
    assert!(title.chars().count() <= 40);
}

#[test]
fn test_ensure_min_cta_blocks_inserts_after_second_paragraph() {
    let body = "一段落目\n\n二段落目\n\n三段落目";
    let updated = ensure_min_cta_blocks(body, "Canva", "https://aff.test/c", 2);
    let paragraphs: Vec<&str> = updated.split("\n\n").collect();

    assert_eq!(cta_count(&updated), 2);
    assert_eq!(paragraphs[0], "一段落目");
    assert_eq!(paragraphs[1], "二段落目");
    assert!(paragraphs[2].contains("rel=\"sponsored nofollow\""));
    assert_eq!(paragraphs[4], "三段落目");

    let unchanged = ensure_min_cta_blocks(&updated, "Canva", "https://aff.test/c", 2);
    assert_eq!(cta_count(&unchanged), 2);
}

#[test]
fn test_parse_model_output() {
    let (title, body) = parse_model_output("\n  タイトル行 \n\n本文1\n本文2\n", "代替");
    assert_eq!(title, "タイトル行");
    assert_eq!(body, "本文1\n\n本文2");

    let (title, body) = parse_model_output("   ", "代替");
    assert_eq!(title, "代替");
    assert_eq!(body, "   ");
}

#[tokio::test]
async fn test_generate_article_forced_template_skips_generator() {
    let generator = MockGenerator::new("unused");
    let settings = GenerationSettings {
        force_template: true,
        ..model_settings()
    };

    let outcome = generate_article(&request(), &settings, &generator).await;
    assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::ForcedTemplate));
    assert_eq!(generator.call_count(), 0);
    assert!(!outcome.draft().used_model);
}

#[tokio::test]
async fn test_generate_article_configuration_fallbacks() {
    let generator = MockGenerator::new("unused");

    let settings = GenerationSettings {
        provider: "openai".to_string(),
        ..model_settings()
    };
    let outcome = generate_article(&request(), &settings, &generator).await;
    assert_eq!(
        outcome.fallback_reason(),
        Some(&FallbackReason::UnsupportedProvider("openai".to_string()))
    );

    let settings = GenerationSettings {
        credential: Some("   ".to_string()),
        ..model_settings()
    };
    let outcome = generate_article(&request(), &settings, &generator).await;
    assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::MissingCredential));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_generate_article_uses_model_output() {
    let generator = MockGenerator::new("long").with_response(long_model_output());
    info!("Using {}", generator.generator_name());

    let outcome = generate_article(&request(), &model_settings(), &generator).await;
    let draft = match outcome {
        DraftOutcome::ModelGenerated(draft) => draft,
        other => panic!("expected model draft, got {:?}", other.fallback_reason()),
    };

    assert_eq!(generator.call_count(), 1);
    assert!(draft.used_model);
    assert!(draft.body.starts_with(DISCLOSURE));
    assert!(cta_count(&draft.body) >= 2);
    assert!(draft.title.contains("AI導入"));
}

#[tokio::test]
async fn test_generate_article_short_or_failed_output_falls_back() {
    let short = MockGenerator::new("short").with_response("タイトル\n短い本文");
    let outcome = generate_article(&request(), &model_settings(), &short).await;
    assert!(matches!(
        outcome.fallback_reason(),
        Some(FallbackReason::TooShort { min_chars: 1400, .. })
    ));
    assert_eq!(outcome.draft(), &fallback_article(&request()));

    let failing = MockGenerator::new("down").with_failure("model is loading");
    let outcome = generate_article(&request(), &model_settings(), &failing).await;
    assert!(matches!(outcome.fallback_reason(), Some(FallbackReason::CallFailed(_))));
    assert!(!outcome.draft().used_model);
}

#[test]
fn test_checklist_keyword_title_fits() {
    let title = optimize_title_for_ctr("", "AI導入 チェックリスト", "", "Notion AI", 2026, 48);
    assert!(title.chars().count() <= 48);
    assert!(title.contains("AI導入"));
}
