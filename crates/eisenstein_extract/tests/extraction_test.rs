use eisenstein_core::ExtractionMethod;
use eisenstein_extract::{ExtractionOutcome, JsonExtractor, ParseErrorKind};
use serde_json::{Value, json};

fn fenced(value: &Value, tag: &str) -> String {
    format!(
        "Here you go:\n```{}\n{}\n```\nLet me know if you need changes.",
        tag,
        serde_json::to_string_pretty(value).unwrap()
    )
}

#[test]
fn test_fence_wrapped_round_trip() {
    let values = [
        json!({"prompts": [{"text": "A rainy neon street", "mood": "noir", "timestamp": "00:15"}]}),
        json!([1, "two", {"three": [3]}]),
        json!({"nested": {"deep": {"list": [true, false, null]}}, "quote": "she said \"cut\""}),
        json!("just a string"),
        json!(3.5),
    ];

    for value in &values {
        for tag in ["json", "JSON", ""] {
            let mut extractor = JsonExtractor::default();
            let doc = extractor
                .extract_json(&fenced(value, tag))
                .unwrap_or_else(|| panic!("no extraction for {} with tag {:?}", value, tag));
            assert_eq!(doc.data(), value);
            assert!(matches!(
                doc.method(),
                ExtractionMethod::FenceBlock | ExtractionMethod::RegexPattern
            ));
            assert!(*doc.confidence() >= 0.85);
        }
    }
}

#[test]
fn test_exhaustive_attempt_before_failure() {
    let inputs = [
        "",
        "I'm sorry, I can't produce a storyboard for that.",
        "Scene one: the camera pans across a field of wheat.",
    ];
    for input in inputs {
        let mut extractor = JsonExtractor::default();
        assert!(extractor.extract_json(input).is_none());
        assert_eq!(extractor.attempted_methods(), ExtractionMethod::in_order());
        assert_eq!(extractor.method_failures().len(), 3);
        assert!(extractor.last_error().is_some());
    }
}

#[test]
fn test_error_completeness() {
    let inputs = [
        "no json at all",
        "{\"prompts\": [{\"text\": \"cut off mid",
        "{ this is : not [ json } ]",
        "   \n  ",
    ];
    for input in inputs {
        let mut extractor = JsonExtractor::default();
        let error = extractor.create_parse_error(input);
        assert_eq!(error.original_content(), input);
        assert_eq!(*error.content_length(), input.chars().count());
        assert!(!error.attempted_methods().is_empty());
        assert!(!error.failure_reasons().is_empty());
        assert!(!error.suggestions().is_empty());
    }
}

#[test]
fn test_parse_error_kinds() {
    let mut extractor = JsonExtractor::default();
    assert_eq!(
        *extractor.create_parse_error("no json at all").kind(),
        ParseErrorKind::NoJsonFound
    );
    assert_eq!(*extractor.create_parse_error("").kind(), ParseErrorKind::EmptyResponse);
    assert_eq!(
        *extractor.create_parse_error("```json\n{\"a\": [1, 2").kind(),
        ParseErrorKind::Truncated
    );
    assert_eq!(
        *extractor.create_parse_error("{ this is : not [ json } ]").kind(),
        ParseErrorKind::MalformedJson
    );
}

#[test]
fn test_selection_prefers_storyboard_object() {
    let raw = r#"Storyboard: {"prompts": [{"text": "A lone rider crosses the salt flats"}]}
Model info: {"model": "test-1", "tokens": 512}"#;
    let mut extractor = JsonExtractor::default();
    let doc = extractor.extract_json(raw).unwrap();
    assert_eq!(*doc.method(), ExtractionMethod::RegexPattern);
    assert!(!doc.data()["prompts"].as_array().unwrap().is_empty());
    assert_eq!(*doc.retry_count(), 1);

    let reversed = r#"{"model": "test-1"} then {"prompts": [{"text": "A lone rider crosses the salt flats"}]}"#;
    let doc = JsonExtractor::default().extract_json(reversed).unwrap();
    assert!(doc.data().get("prompts").is_some());
}

#[test]
fn test_format_tolerance() {
    let raw = "{\n\n   \"prompts\"  :\n [\n  {  \"text\":\n \"Dust swirls   in a sunlit barn\" ,\"mood\"\n:\"warm\" }\n\n ]\n}\n";
    let doc = JsonExtractor::default().extract_json(raw).unwrap();
    assert_eq!(doc.data()["prompts"][0]["text"], "Dust swirls   in a sunlit barn");
    assert_eq!(doc.data()["prompts"][0]["mood"], "warm");
}

#[test]
fn test_corrector_assisted_extraction() {
    let raw = "Sure! {prompts: [{text: 'A paper boat drifts down a gutter', mood: 'wistful',},]} // hope this helps";
    let doc = JsonExtractor::default().extract_json(raw).unwrap();
    assert_eq!(*doc.method(), ExtractionMethod::RegexPattern);
    assert_eq!(doc.data()["prompts"][0]["mood"], "wistful");
    assert!(*doc.confidence() < 0.85);
}

#[test]
fn test_failures_survive_later_success() {
    let raw = "```json\n{broken\n```\nActually: {\"prompts\": [{\"text\": \"A kite over the dunes\"}]}";
    let mut extractor = JsonExtractor::default();
    let ExtractionOutcome::Extracted(doc) = extractor.extract(raw) else {
        panic!("expected extraction");
    };
    assert_eq!(*doc.method(), ExtractionMethod::RegexPattern);
    assert_eq!(extractor.method_failures().len(), 1);
    assert_eq!(*extractor.method_failures()[0].method(), ExtractionMethod::FenceBlock);
    assert_eq!(
        extractor.attempted_methods(),
        [ExtractionMethod::FenceBlock, ExtractionMethod::RegexPattern]
    );
}

#[test]
fn test_end_to_end_fence_scenario() {
    let raw = "Here's the result:\n\n```json\n{\"prompts\":[{\"text\":\"A rainy neon street at night, wide shot, cold blue light\",\"mood\":\"noir\",\"timestamp\":\"00:15\"}]}\n```\n\nEnjoy!";
    let doc = JsonExtractor::default().extract_json(raw).unwrap();
    assert_eq!(*doc.method(), ExtractionMethod::FenceBlock);
    assert_eq!(*doc.retry_count(), 0);
    assert_eq!(doc.data()["prompts"][0]["timestamp"], "00:15");
}
