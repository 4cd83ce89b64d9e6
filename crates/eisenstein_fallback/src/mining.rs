//! Plain-text heuristics used to mine scene descriptions.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Keys whose string values are mined from JSON-looking text that failed to parse.
pub const TEXT_KEYS: &[&str] = &["text", "description", "prompt", "visual", "content"];

// Words ignored when measuring how much of the source survived.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "also", "been", "before", "below", "could", "description",
    "each", "from", "have", "here", "into", "json", "just", "like", "mood", "more", "most",
    "only", "onto", "over", "panel", "prompt", "prompts", "result", "should", "some",
    "storyboard", "such", "sure", "text", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "timestamp", "under", "upon", "very", "were",
    "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

static TEXT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r#""(?:{})"\s*:\s*"((?:[^"\\]|\\.)*)(?:"|$)"#,
        TEXT_KEYS.join("|")
    );
    Regex::new(&pattern).expect("text pair pattern is valid")
});

static SCENE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:#+\s*)?\**\b(?:scene|shot|frame|panel)\s*#?\d+\b\**\s*[:.)\-]\**")
        .expect("scene marker pattern is valid")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+").expect("list item pattern is valid")
});

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern is valid"));

static FENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*```[\w-]*\s*$").expect("fence pattern is valid"));

static MOOD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(\[]?\b(?:mood|tone)\s*[:=]\s*([a-z][a-z\-]*)[)\]]?[.,;]?")
        .expect("mood label pattern is valid")
});

static TIMESTAMP_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(\[]?(?:\b(?:timestamp|time|at)\s*[:=]?\s*)?\b(\d{1,2}:\d{2})\b[)\]]?[.,;]?")
        .expect("timestamp label pattern is valid")
});

static MARKDOWN_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|__|`|^[#>\s*_\-]+").expect("markdown pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// String values of `"text": "..."` style pairs, in order.
///
/// A final unterminated value is kept, so truncated JSON still yields text.
pub fn mine_text_pairs(text: &str) -> Vec<String> {
    TEXT_PAIR
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            let value = serde_json::from_str::<String>(&format!("\"{raw}\""))
                .unwrap_or_else(|_| raw.replace("\\\"", "\"").replace("\\n", " "));
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        })
        .collect()
}

/// Split prose into candidate scene fragments using layout cues.
///
/// Tries explicit scene markers, then list items, then paragraphs, and
/// finally sentences when the text is a single paragraph.
pub fn split_fragments(text: &str) -> Vec<String> {
    let text = FENCE_LINE.replace_all(text, "");

    let by_marker = split_on_markers(&text);
    if !by_marker.is_empty() {
        return by_marker;
    }

    let by_list = split_list_items(&text);
    if by_list.len() >= 2 {
        return by_list;
    }

    let paragraphs: Vec<String> = PARAGRAPH_BREAK
        .split(&text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if paragraphs.len() >= 2 {
        return paragraphs;
    }

    paragraphs
        .first()
        .map(|paragraph| split_sentences(paragraph))
        .unwrap_or_default()
}

fn split_on_markers(text: &str) -> Vec<String> {
    let starts: Vec<(usize, usize)> = SCENE_MARKER
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    if starts.is_empty() {
        return Vec::new();
    }

    let mut fragments = Vec::with_capacity(starts.len() + 1);
    let preamble = text[..starts[0].0].trim();
    if !preamble.is_empty() {
        fragments.push(preamble.to_string());
    }
    for (i, (_, body_start)) in starts.iter().enumerate() {
        let body_end = starts.get(i + 1).map_or(text.len(), |(next, _)| *next);
        let body = text[*body_start..body_end].trim();
        if !body.is_empty() {
            fragments.push(body.to_string());
        }
    }
    fragments
}

fn split_list_items(text: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(marker) = LIST_ITEM.find(line) {
            if let Some(done) = current.take() {
                items.push(done);
            }
            current = Some(line[marker.end()..].trim().to_string());
        } else if line.trim().is_empty() {
            if let Some(done) = current.take() {
                items.push(done);
            }
        } else if let Some(item) = current.as_mut() {
            item.push(' ');
            item.push_str(line.trim());
        }
    }
    items.extend(current);
    items.retain(|item| !item.is_empty());
    items
}

fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().is_some_and(|(_, next)| next.is_whitespace())
        {
            let end = i + ch.len_utf8();
            sentences.push(paragraph[start..end].trim().to_string());
            start = end;
        }
    }
    sentences.push(paragraph[start..].trim().to_string());
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// A fragment with its labels lifted out.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Prose with markdown, mood and timestamp labels removed
    pub text: String,
    /// Mood named by a `mood:` label
    pub mood_label: Option<String>,
    /// Embedded `M:SS` offset
    pub timestamp: Option<String>,
}

/// Remove markdown noise and lift `mood:`/timestamp labels out of the prose.
pub fn clean_fragment(raw: &str) -> Fragment {
    let mood_label = MOOD_LABEL
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase());
    let without_mood = MOOD_LABEL.replace_all(raw, " ");

    let timestamp = TIMESTAMP_LABEL
        .captures(&without_mood)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let without_time = TIMESTAMP_LABEL.replace_all(&without_mood, " ");

    let lines: Vec<String> = without_time
        .lines()
        .map(|line| MARKDOWN_NOISE.replace_all(line, "").into_owned())
        .collect();
    let single_line = lines.join(" ");
    let joined = WHITESPACE.replace_all(&single_line, " ");
    let text = joined
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '-' | '–' | ':' | ','))
        .trim()
        .to_string();

    Fragment {
        text,
        mood_label,
        timestamp,
    }
}

/// Lowercased alphanumeric words.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

// Folds a simple plural onto its singular.
fn stem(word: &str) -> &str {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        &word[..word.len() - 1]
    } else {
        word
    }
}

/// Number of distinct vocabulary words the text uses.
pub fn vocabulary_hits(text: &str, vocabulary: &[String]) -> usize {
    let found: BTreeSet<String> = words(text)
        .filter(|word| {
            vocabulary
                .iter()
                .any(|v| v == word || v == stem(word))
        })
        .collect();
    found.len()
}

/// First vocabulary word appearing in the text.
pub fn first_vocabulary_word(text: &str, vocabulary: &[String]) -> Option<String> {
    words(text).find_map(|word| {
        vocabulary
            .iter()
            .find(|v| **v == word || *v == stem(&word))
            .cloned()
    })
}

/// Distinct content words: four letters or more and not a stopword.
pub fn key_words(text: &str) -> BTreeSet<String> {
    words(text)
        .filter(|w| w.chars().count() >= 4 && !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| stem(&w).to_string())
        .collect()
}

/// Share of the source's key words that appear in the output (1.0 when the source has none).
pub fn keyword_overlap(source: &str, output: &str) -> f64 {
    let wanted = key_words(source);
    if wanted.is_empty() {
        return 1.0;
    }
    let kept = key_words(output);
    wanted.intersection(&kept).count() as f64 / wanted.len() as f64
}

/// True when the fragment reads as an introduction to what follows.
pub fn is_introduction(text: &str) -> bool {
    text.trim_end().ends_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_mines_pairs_including_truncated_tail() {
        let text = r#"{"prompts": [{"description": "A lighthouse in \"heavy\" fog"}, {"text": "Waves break over the rocks at du"#;
        assert_eq!(
            mine_text_pairs(text),
            ["A lighthouse in \"heavy\" fog", "Waves break over the rocks at du"]
        );
    }

    #[test]
    fn test_splits_on_scene_markers() {
        let text = "Here is your storyboard:\n**Scene 1:** A foggy pier at dawn.\n**Scene 2:** Gulls circle a fishing boat.";
        assert_eq!(
            split_fragments(text),
            ["Here is your storyboard:", "A foggy pier at dawn.", "Gulls circle a fishing boat."]
        );
    }

    #[test]
    fn test_splits_lists_then_paragraphs_then_sentences() {
        let list = "1. A red kite over the cliff\n2. The kite string snaps\n   in the wind";
        assert_eq!(
            split_fragments(list),
            ["A red kite over the cliff", "The kite string snaps in the wind"]
        );

        let paragraphs = "A quiet harbour at dawn.\n\nFishermen load crates onto a boat.";
        assert_eq!(split_fragments(paragraphs).len(), 2);

        let sentences = "Rain hits the window. A woman reads by candlelight! Version 2.0 ships";
        assert_eq!(
            split_fragments(sentences),
            ["Rain hits the window.", "A woman reads by candlelight!", "Version 2.0 ships"]
        );
    }

    #[test]
    fn test_clean_fragment_lifts_labels() {
        let fragment = clean_fragment("## A neon alley in the rain (mood: noir) [0:45]");
        assert_eq!(fragment.text, "A neon alley in the rain");
        assert_eq!(fragment.mood_label.as_deref(), Some("noir"));
        assert_eq!(fragment.timestamp.as_deref(), Some("0:45"));
    }

    #[test]
    fn test_clean_fragment_joins_lines() {
        let fragment = clean_fragment("**A lighthouse**\n  in   sea fog,\n> waves below");
        assert_eq!(fragment.text, "A lighthouse in sea fog, waves below");
    }

    #[test]
    fn test_vocabulary_matches_plurals() {
        let keywords = vocab(&["cloud", "ocean"]);
        assert_eq!(vocabulary_hits("Dramatic clouds over the ocean", &keywords), 2);
        assert_eq!(
            first_vocabulary_word("Dramatic clouds", &vocab(&["dramatic"])),
            Some("dramatic".to_string())
        );
    }

    #[test]
    fn test_keyword_overlap() {
        let source = "A sunset over the ocean with orange clouds";
        assert_eq!(keyword_overlap(source, source), 1.0);
        assert_eq!(keyword_overlap(source, "sunset ocean"), 0.5);
        assert_eq!(keyword_overlap("over the", "anything"), 1.0);
    }
}
