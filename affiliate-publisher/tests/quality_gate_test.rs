use affiliate_publisher::quality_gate::{
    content_char_count, duplicate_ratio, find_external_anchors, DEFAULT_SENTENCE_DELIMITERS,
};
use affiliate_publisher::{run_quality_gate, QualityGate};
use tracing::info;

const DISCLOSURE: &str = "本記事には広告・アフィリエイトリンクが含まれます";

fn distinct_sentences(count: usize) -> String {
    (0..count)
        .map(|index| format!("これは検証用の文章その{}です。", index))
        .collect()
}

fn passing_post() -> String {
    format!(
        "---\nlayout: post\ntitle: \"テスト\"\n---\n\n{}\n\n{}\n\n<p><a href=\"https://aff.test/x\" rel=\"sponsored nofollow\" target=\"_blank\">公式</a></p>\n",
        DISCLOSURE,
        distinct_sentences(40)
    )
}

#[test]
fn test_gate_passes_clean_post() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let result = QualityGate::new(200, DISCLOSURE).check(&passing_post());
    info!("Gate issues: {:?}", result.issues);
    assert!(result.passed, "unexpected issues: {:?}", result.issues);
    assert!(result.issues.is_empty());
}

#[test]
fn test_gate_reports_short_body() {
    let text = format!(
        "{}<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        DISCLOSURE
    );
    let result = QualityGate::new(1400, DISCLOSURE).check(&text);
    assert!(!result.passed);
    assert!(result.issues.iter().any(|issue| issue.starts_with("body too short")));
}

#[test]
fn test_front_matter_is_not_counted() {
    let body = "あいうえお";
    let with_front_matter = format!("---\ntitle: \"長い長い長い長いタイトル\"\n---\n{}", body);
    assert_eq!(content_char_count(&with_front_matter), 5);
    assert_eq!(content_char_count("<p>あい う\nえお</p>"), 5);
}

#[test]
fn test_duplicate_ratio() {
    assert_eq!(duplicate_ratio("", DEFAULT_SENTENCE_DELIMITERS), 0.0);
    assert_eq!(duplicate_ratio("a。b。c。d", DEFAULT_SENTENCE_DELIMITERS), 0.0);
    // Three copies of one sentence out of four: two duplicates
    let ratio = duplicate_ratio("同じ。同じ。\n同じ。違う。", DEFAULT_SENTENCE_DELIMITERS);
    assert!((ratio - 0.5).abs() < 1e-9);
}

#[test]
fn test_gate_flags_repetitive_text() {
    let text = format!(
        "{}\n{}\n<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        DISCLOSURE,
        "同じ文章です。".repeat(30)
    );
    let result = QualityGate::new(10, DISCLOSURE).check(&text);
    assert!(result
        .issues
        .iter()
        .any(|issue| issue.starts_with("duplicate sentence ratio too high")));

    let lenient = run_quality_gate(&text, 10, DISCLOSURE, 1.0);
    assert!(lenient.passed, "unexpected issues: {:?}", lenient.issues);
}

#[test]
fn test_gate_flags_banned_phrase_and_missing_disclosure() {
    let text = format!(
        "{}この方法なら元本保証です。\n<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        distinct_sentences(10)
    );
    let result = QualityGate::new(10, DISCLOSURE).check(&text);
    assert!(result.issues.contains(&"banned phrase found: 元本保証".to_string()));
    assert!(result
        .issues
        .contains(&"disclosure text is missing from the post".to_string()));
}

#[test]
fn test_gate_banned_phrases_are_configurable() {
    let text = format!(
        "{}{}\n<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        DISCLOSURE,
        distinct_sentences(10)
    );
    let gate = QualityGate::new(10, DISCLOSURE).with_banned_phrases(vec!["検証用".to_string()]);
    let result = gate.check(&text);
    assert_eq!(result.issues, vec!["banned phrase found: 検証用".to_string()]);
}

#[test]
fn test_gate_link_rules() {
    let base = format!("{}{}", DISCLOSURE, distinct_sentences(10));

    let markdown = format!(
        "{}\n[公式](https://aff.test)\n<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        base
    );
    let result = QualityGate::new(10, DISCLOSURE).check(&markdown);
    assert!(result.issues.iter().any(|issue| issue.starts_with("markdown external link found")));

    let no_link = QualityGate::new(10, DISCLOSURE).check(&base);
    assert!(no_link.issues.contains(&"no outbound CTA link found".to_string()));

    let bare = format!("{}\n<a href=\"https://bare.test/x\" target=\"_blank\">x</a>", base);
    let result = QualityGate::new(10, DISCLOSURE).check(&bare);
    assert_eq!(
        result.issues,
        vec!["outbound link (https://bare.test/x) is missing rel=\"sponsored nofollow\"".to_string()]
    );

    // Token order in rel does not matter
    let reordered = format!(
        "{}\n<a href=\"https://aff.test\" rel=\"nofollow sponsored\">x</a>",
        base
    );
    assert!(QualityGate::new(10, DISCLOSURE).check(&reordered).passed);
}

#[test]
fn test_find_external_anchors_ignores_relative_links() {
    let text = r#"<a href="/posts/local/">local</a> <a class="cta" href="https://aff.test/y" rel="sponsored nofollow">y</a>"#;
    let anchors = find_external_anchors(text);
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].href, "https://aff.test/y");
    assert!(anchors[0].attrs.contains("class=\"cta\""));
}

#[test]
fn test_gate_sentence_delimiters_are_configurable() {
    let text = format!(
        "{}\n{}\n<a href=\"https://aff.test\" rel=\"sponsored nofollow\">x</a>",
        DISCLOSURE,
        "Same sentence here. ".repeat(10)
    );

    // Japanese delimiters see the English line as one sentence
    let result = QualityGate::new(10, DISCLOSURE).check(&text);
    assert!(result.passed, "unexpected issues: {:?}", result.issues);

    let english = QualityGate::new(10, DISCLOSURE).with_sentence_delimiters(vec!['.', '\n']);
    let result = english.check(&text);
    assert!(result
        .issues
        .iter()
        .any(|issue| issue.starts_with("duplicate sentence ratio too high")));
}
