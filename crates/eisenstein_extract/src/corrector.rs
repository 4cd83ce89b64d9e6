//! Textual repair of almost-JSON model output.
//!
//! Models wrap JSON in markdown fences, add commentary, leave trailing commas,
//! use single quotes or forget to quote keys. The [`FormatCorrector`] runs an
//! ordered list of named [`Correction`]s over the text. Each one is a pure
//! function that only touches text outside double-quoted strings (except the
//! control-character escape, which only touches text inside them).

use crate::scan::{QuoteTracker, balanced_end, opening_positions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LANGUAGE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*[A-Za-z][\w+-]*[ \t]*\r?\n(.*?)```")
        .expect("language fence pattern is valid")
});

static DANGLING_LANGUAGE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[ \t]*[A-Za-z][\w+-]*[ \t]*\r?\n").expect("dangling fence pattern is valid")
});

static TRAILING_COMMA_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*[}\]]").expect("trailing comma pattern is valid"));

static SINGLE_QUOTED_KEY_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'[^'"\n]+'\s*:"#).expect("single quoted key pattern is valid")
});

static COMMENT_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|[\s,{\[])//|/\*").expect("comment pattern is valid")
});

/// Confidence tuning for the corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct CorrectorConfig {
    /// Confidence lost per applied correction
    pub penalty_per_correction: f64,
    /// Lowest confidence a corrected document can have
    pub confidence_floor: f64,
    /// Confidence ceiling when the result still does not open with `{` or `[`
    pub non_json_cap: f64,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            penalty_per_correction: 0.1,
            confidence_floor: 0.5,
            non_json_cap: 0.3,
        }
    }
}

/// One named, pure text repair.
#[derive(Debug, Clone, Copy)]
pub struct Correction {
    name: &'static str,
    apply: fn(&str) -> String,
}

impl Correction {
    /// Name reported in [`CorrectionResult::applied_corrections`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the repair.
    pub fn apply(&self, text: &str) -> String {
        (self.apply)(text)
    }
}

/// Repairs in the order they run.
///
/// Comments are stripped before surrounding text so that a commented-out
/// brace cannot become the document boundary.
pub const CORRECTIONS: &[Correction] = &[
    Correction {
        name: "strip_language_fences",
        apply: strip_language_fences,
    },
    Correction {
        name: "strip_generic_fences",
        apply: strip_generic_fences,
    },
    Correction {
        name: "strip_comments",
        apply: strip_comments,
    },
    Correction {
        name: "strip_surrounding_text",
        apply: strip_surrounding_text,
    },
    Correction {
        name: "remove_trailing_commas",
        apply: remove_trailing_commas,
    },
    Correction {
        name: "convert_single_quotes",
        apply: convert_single_quotes,
    },
    Correction {
        name: "quote_bare_keys",
        apply: quote_bare_keys,
    },
    Correction {
        name: "escape_control_characters",
        apply: escape_control_characters,
    },
];

/// Output of [`FormatCorrector::correct`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionResult {
    /// Repaired text
    corrected: String,
    /// True iff `corrected` differs from the input
    was_modified: bool,
    /// Names of the corrections that changed something, in order
    applied_corrections: Vec<String>,
    /// Trust in the repaired text, `[0, 1]`
    confidence: f64,
}

impl CorrectionResult {
    /// Repaired text.
    pub fn corrected(&self) -> &str {
        &self.corrected
    }

    /// True iff the text changed.
    pub fn was_modified(&self) -> bool {
        self.was_modified
    }

    /// Names of the corrections that changed something, in order.
    pub fn applied_corrections(&self) -> &[String] {
        &self.applied_corrections
    }

    /// Trust in the repaired text, `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Take the repaired text.
    pub fn into_corrected(self) -> String {
        self.corrected
    }
}

/// Runs [`CORRECTIONS`] over model output.
///
/// # Examples
///
/// ```
/// use eisenstein_extract::FormatCorrector;
///
/// let corrector = FormatCorrector::default();
/// let result = corrector.correct("```json\n{'prompts': [{text: 'A foggy pier at dawn',},],}\n```");
///
/// assert!(result.was_modified());
/// let value: serde_json::Value = serde_json::from_str(result.corrected()).unwrap();
/// assert_eq!(value["prompts"][0]["text"], "A foggy pier at dawn");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatCorrector {
    config: CorrectorConfig,
}

impl FormatCorrector {
    /// Corrector with explicit tuning.
    pub fn new(config: CorrectorConfig) -> Self {
        Self { config }
    }

    /// Current tuning.
    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// Apply every correction in order.
    #[tracing::instrument(skip(self, text), fields(len = text.len()))]
    pub fn correct(&self, text: &str) -> CorrectionResult {
        let mut current = text.to_string();
        let mut applied = Vec::new();

        for correction in CORRECTIONS {
            let next = correction.apply(&current);
            if next != current {
                tracing::trace!(correction = correction.name(), "Correction applied");
                applied.push(correction.name().to_string());
                current = next;
            }
        }

        let was_modified = current != text;
        let confidence = self.confidence(&current, applied.len());
        if was_modified {
            tracing::debug!(corrections = applied.len(), confidence, "Corrected model output");
        }

        CorrectionResult {
            corrected: current,
            was_modified,
            applied_corrections: applied,
            confidence,
        }
    }

    fn confidence(&self, corrected: &str, applied: usize) -> f64 {
        let mut confidence = if applied == 0 {
            1.0
        } else {
            (1.0 - self.config.penalty_per_correction * applied as f64)
                .max(self.config.confidence_floor)
        };
        if !corrected.trim_start().starts_with(['{', '[']) {
            confidence = confidence.min(self.config.non_json_cap);
        }
        confidence.clamp(0.0, 1.0)
    }
}

/// Cheap check for the defects the corrector repairs.
///
/// True for fences, trailing commas, single-quoted keys, comments, or text
/// that does not open with `{` or `[`. Blank text needs nothing.
pub fn needs_correction(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.contains("```")
        || !trimmed.starts_with(['{', '['])
        || TRAILING_COMMA_HINT.is_match(trimmed)
        || SINGLE_QUOTED_KEY_HINT.is_match(trimmed)
        || COMMENT_HINT.is_match(trimmed)
}

/// Replace ```` ```lang ... ``` ```` blocks with their content.
/// An opening language fence with no closer is dropped.
pub fn strip_language_fences(text: &str) -> String {
    let closed = LANGUAGE_FENCE.replace_all(text, "$1");
    DANGLING_LANGUAGE_FENCE.replace_all(&closed, "").into_owned()
}

/// Remove any remaining triple-backtick fences.
pub fn strip_generic_fences(text: &str) -> String {
    text.replace("```", "")
}

/// Remove `//` line comments and `/* */` block comments outside strings.
///
/// `//` only starts a comment after whitespace, a line start or one of `,{[`,
/// so `http://` in unquoted prose survives.
pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut tracker = QuoteTracker::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if tracker.step(ch) {
            out.push(ch);
            i += 1;
            continue;
        }
        let next = chars.get(i + 1).copied();
        if ch == '/' && next == Some('/') && comment_may_start(out.chars().next_back()) {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }
        if ch == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            continue;
        }
        out.push(ch);
        i += 1;
    }

    trim_line_ends(&out, text)
}

fn comment_may_start(previous: Option<char>) -> bool {
    match previous {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, ',' | '{' | '['),
    }
}

// Comment removal leaves trailing blanks behind; only clean up if something changed.
fn trim_line_ends(out: &str, original: &str) -> String {
    if out == original {
        return out.to_string();
    }
    let mut cleaned: Vec<&str> = out.lines().map(str::trim_end).collect();
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

/// Cut prose before and after the JSON document.
///
/// The document starts at the first `{` or `[` whose balanced span looks like
/// data (bracketed prose such as `[Note]` is skipped). Without a balanced span
/// the text is cut from the first opener to the last closer.
pub fn strip_surrounding_text(text: &str) -> String {
    let openers = opening_positions(text);
    let Some(&first) = openers.first() else {
        return text.to_string();
    };

    let balanced = openers.iter().find_map(|&start| {
        balanced_end(text, start)
            .filter(|&end| looks_like_data(&text[start..end]))
            .map(|end| (start, end))
    });

    let (start, end) = match balanced {
        Some(span) => span,
        None => {
            let last_closer = text.rfind(['}', ']']).filter(|&pos| pos > first);
            (first, last_closer.map_or(text.len(), |pos| pos + 1))
        }
    };

    text[start..end].to_string()
}

fn looks_like_data(span: &str) -> bool {
    let inner = &span[1..span.len() - 1];
    inner.trim().is_empty()
        || inner.contains(['"', '\'', ':', '{', '['])
        || inner
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, ',' | '.' | '-'))
}

/// Drop commas directly followed (after whitespace) by `}` or `]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut tracker = QuoteTracker::default();

    for (i, &ch) in chars.iter().enumerate() {
        if tracker.step(ch) {
            out.push(ch);
            continue;
        }
        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Rewrite `'single quoted'` strings outside double-quoted strings.
///
/// A single-quoted run that spans a newline or contains a double quote is
/// left alone.
pub fn convert_single_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut tracker = QuoteTracker::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if tracker.step(ch) || ch != '\'' {
            out.push(ch);
            i += 1;
            continue;
        }

        match closing_single_quote(&chars, i + 1) {
            Some(close) => {
                out.push('"');
                let mut j = i + 1;
                while j < close {
                    if chars[j] == '\\' && chars.get(j + 1) == Some(&'\'') {
                        out.push('\'');
                        j += 2;
                    } else {
                        out.push(chars[j]);
                        j += 1;
                    }
                }
                out.push('"');
                i = close + 1;
            }
            None => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

fn closing_single_quote(chars: &[char], from: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            '\'' => return Some(j),
            '"' | '\n' => return None,
            _ => j += 1,
        }
    }
    None
}

/// Quote identifier keys such as `{text: ...}`.
pub fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut tracker = QuoteTracker::default();
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if tracker.step(ch) {
            out.push(ch);
            if !tracker.in_string() {
                last_significant = Some('"');
            }
            i += 1;
            continue;
        }

        let key_position = matches!(last_significant, Some('{') | Some(','));
        if key_position && (ch.is_ascii_alphabetic() || ch == '_' || ch == '$') {
            let mut end = i;
            while end < chars.len()
                && (chars[end].is_ascii_alphanumeric() || matches!(chars[end], '_' | '$' | '-'))
            {
                end += 1;
            }
            let after = chars[end..].iter().find(|c| !c.is_whitespace());
            let ident: String = chars[i..end].iter().collect();
            if after == Some(&':') {
                out.push('"');
                out.push_str(&ident);
                out.push('"');
            } else {
                out.push_str(&ident);
            }
            last_significant = chars[end - 1..end].first().copied();
            i = end;
            continue;
        }

        if !ch.is_whitespace() {
            last_significant = Some(ch);
        }
        out.push(ch);
        i += 1;
    }
    out
}

/// Escape raw newlines, carriage returns and tabs inside strings.
pub fn escape_control_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut tracker = QuoteTracker::default();

    for ch in text.chars() {
        let inside = tracker.step(ch);
        match ch {
            '\n' if inside => out.push_str("\\n"),
            '\r' if inside => out.push_str("\\r"),
            '\t' if inside => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn parses(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_language_fence() {
        let text = "Here:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(strip_language_fences(text), "Here:\n{\"a\": 1}\n\nThanks");
        assert_eq!(strip_language_fences("```json\n{\"a\": 1"), "{\"a\": 1");
    }

    #[test]
    fn test_comments_keep_urls_in_strings() {
        let text = "{\n  \"url\": \"http://x.io/a\", // link\n  /* note */ \"b\": 2\n}";
        let stripped = strip_comments(text);
        let value = parses(&stripped);
        assert_eq!(value["url"], "http://x.io/a");
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn test_surrounding_text_skips_bracketed_prose() {
        let text = "[Note] the storyboard is {\"prompts\": []} as requested.";
        assert_eq!(strip_surrounding_text(text), "{\"prompts\": []}");
    }

    #[test]
    fn test_trailing_commas() {
        assert_eq!(remove_trailing_commas("{\"a\": [1, 2,], }"), "{\"a\": [1, 2] }");
        assert_eq!(remove_trailing_commas("{\"a\": \",]\"}"), "{\"a\": \",]\"}");
    }

    #[test]
    fn test_single_quotes_leave_apostrophes_in_strings() {
        let text = "{'text': 'a dog\\'s bark', \"mood\": \"it's calm\"}";
        let value = parses(&convert_single_quotes(text));
        assert_eq!(value["text"], "a dog's bark");
        assert_eq!(value["mood"], "it's calm");
    }

    #[test]
    fn test_bare_keys() {
        let text = "{text: \"x\", mood_1: \"y\", list: [true, false]}";
        let value = parses(&quote_bare_keys(text));
        assert_eq!(value["mood_1"], "y");
        assert_eq!(value["list"][1], false);
    }

    #[test]
    fn test_control_characters() {
        let text = "{\"text\": \"line one\nline\ttwo\"}\n";
        let value = parses(&escape_control_characters(text));
        assert_eq!(value["text"], "line one\nline\ttwo");
    }

    #[test]
    fn test_valid_json_untouched() {
        let text = r#"{"prompts": [{"text": "A quiet harbour", "mood": "calm"}]}"#;
        let result = FormatCorrector::default().correct(text);
        assert!(!result.was_modified());
        assert!(result.applied_corrections().is_empty());
        assert_eq!(result.confidence(), 1.0);
        assert!(!needs_correction(text));
    }

    #[test]
    fn test_confidence_penalty_and_floor() {
        let corrector = FormatCorrector::default();
        let one = corrector.correct("{\"a\": 1,}");
        assert_eq!(one.applied_corrections(), ["remove_trailing_commas".to_string()]);
        assert!((one.confidence() - 0.9).abs() < 1e-9);

        let many = corrector.correct("Sure!\n```json\n// c\n{'a': 1, b: 'x\ty',}\n```");
        assert!(many.applied_corrections().len() >= 5);
        assert_eq!(many.confidence(), 0.5);
        assert_eq!(parses(many.corrected())["b"], "x\ty");
    }

    #[test]
    fn test_non_json_capped() {
        let result = FormatCorrector::default().correct("no json here, sorry // really");
        assert!(result.confidence() <= 0.3);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let corrector = FormatCorrector::default();
        let first = corrector.correct("```json\n{'prompts': [{text: 'a',},],}\n```");
        let second = corrector.correct(first.corrected());
        assert!(!second.was_modified());
    }

    #[test]
    fn test_needs_correction_detects_defects() {
        assert!(needs_correction("```json\n{}\n```"));
        assert!(needs_correction("{\"a\": 1,}"));
        assert!(needs_correction("{'a': 1}"));
        assert!(needs_correction("{\"a\": 1} // done"));
        assert!(needs_correction("Result: {}"));
        assert!(!needs_correction("   "));
    }
}
