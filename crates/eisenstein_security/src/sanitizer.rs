//! Neutralising unsafe content embedded in model output.

use crate::{SecurityError, SecurityErrorKind, SecurityResult};
use eisenstein_core::{DEFAULT_MOOD, StoryboardDocument, StoryboardPrompt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Sanitizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Maximum characters kept per string field
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Extra regex patterns to strip, on top of the built-in rules
    #[serde(default)]
    pub prohibited_patterns: Vec<String>,

    /// Upper bound on re-application until the text stops changing
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

fn default_max_length() -> usize {
    4000
}

fn default_max_passes() -> usize {
    4
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            prohibited_patterns: vec![],
            max_passes: default_max_passes(),
        }
    }
}

struct Rule {
    name: &'static str,
    pattern: Regex,
}

impl Rule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("built-in sanitizer pattern is valid"),
        }
    }
}

static BUILT_IN_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("script_block", r"(?is)<script\b[^>]*>.*?</script\s*>"),
        Rule::new("script_tag", r"(?i)</?script\b[^>]*>?"),
        Rule::new("iframe_block", r"(?is)<iframe\b[^>]*>.*?</iframe\s*>"),
        Rule::new("style_block", r"(?is)<style\b[^>]*>.*?</style\s*>"),
        Rule::new(
            "embedding_tag",
            r"(?i)</?(?:iframe|style|object|embed|applet|frame|frameset|meta|link|base)\b[^>]*>?",
        ),
        Rule::new(
            "event_handler",
            r#"(?i)on(?:click|dblclick|load|unload|error|abort|blur|focus\w*|change|input|submit|reset|select|resize|scroll|wheel|copy|cut|paste|toggle|message|contextmenu|begin|end|mouse\w+|key\w+|drag\w*|drop|touch\w+|pointer\w+|animation\w+|transition\w+|play\w*|pause|ended|hashchange|popstate|storage)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#,
        ),
        Rule::new(
            "script_protocol",
            &format!(r"(?i)(?:{})[\s\x00-\x1f]*:", spaced_schemes(SCRIPT_SCHEMES)),
        ),
        Rule::new(
            "executable_data_uri",
            r"(?i)\bdata:\s*(?:text/html|text/javascript|application/(?:x-)?javascript|application/x-shockwave-flash|image/svg\+xml)[^\s'\x22>]*",
        ),
        Rule::new(
            "sql_ddl",
            r"(?i)(?:;\s*)?\b(?:drop|truncate|alter)\s+(?:table|database|schema)\b(?:\s+if\s+exists)?(?:\s+[\w.]+)?(?:\s*;)?",
        ),
        Rule::new(
            "sql_chained_statement",
            r"(?i);\s*(?:delete\s+from|insert\s+into|update\s+[\w.]+\s+set|exec(?:ute)?|shutdown)\b(?:\s+[\w.]+)?(?:\s*;)?",
        ),
        Rule::new("sql_union_select", r"(?i)\bunion\s+(?:all\s+)?select\b"),
        Rule::new("sql_tautology", r"(?i)'\s*or\s+'?1'?\s*=\s*'?1'?"),
        Rule::new("shell_backticks", r"`[^`\n]+`"),
        Rule::new("shell_substitution", r"\$\([^)\n]*\)"),
        Rule::new("shell_expansion", r"\$\{[^}\n]*\}"),
        Rule::new(
            "shell_chained_command",
            r"(?:;|&&|\|\|?)\s*(?:rm\s+-[rf]+|curl|wget|bash|sh|nc|chmod|sudo)\b(?:\s+[^\s;&|]+)?",
        ),
    ]
});

const SCRIPT_SCHEMES: &[&str] = &["javascript", "vbscript", "livescript"];

// Browsers ignore whitespace and control characters inside a scheme name.
fn spaced_schemes(schemes: &[&str]) -> String {
    schemes
        .iter()
        .map(|scheme| {
            scheme
                .chars()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(r"[\s\x00-\x1f]*")
        })
        .collect::<Vec<_>>()
        .join("|")
}

static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("whitespace pattern is valid"));

/// Sanitised text together with the rules that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText {
    text: String,
    applied_rules: Vec<String>,
    truncated: bool,
}

impl SanitizedText {
    /// Cleaned text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the cleaned text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Names of the rules that removed something.
    pub fn applied_rules(&self) -> &[String] {
        &self.applied_rules
    }

    /// True when the text was cut at the length limit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// True when anything changed.
    pub fn was_modified(&self) -> bool {
        self.truncated || !self.applied_rules.is_empty()
    }
}

/// Strips script markup, protocol handlers, SQL and shell fragments from
/// every string it is given.
///
/// # Examples
///
/// ```
/// use eisenstein_security::ContentSanitizer;
///
/// let sanitizer = ContentSanitizer::default();
/// let clean = sanitizer.sanitize_text("Harbour at dusk<script>alert(1)</script>, lanterns glowing");
/// assert_eq!(clean.text(), "Harbour at dusk, lanterns glowing");
///
/// let prose = "A quiet harbour at dusk; lanterns glow on the water.";
/// assert_eq!(sanitizer.sanitize_text(prose).text(), prose);
/// ```
pub struct ContentSanitizer {
    config: SanitizerConfig,
    extra_rules: Vec<Regex>,
}

impl Default for ContentSanitizer {
    fn default() -> Self {
        Self {
            config: SanitizerConfig::default(),
            extra_rules: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ContentSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSanitizer")
            .field("config", &self.config)
            .finish()
    }
}

impl ContentSanitizer {
    /// Create a sanitizer, compiling any extra prohibited patterns.
    pub fn new(config: SanitizerConfig) -> SecurityResult<Self> {
        if config.max_passes == 0 {
            return Err(SecurityError::new(SecurityErrorKind::Configuration(
                "max_passes must be at least 1".to_string(),
            )));
        }

        let mut extra_rules = Vec::new();
        for pattern in &config.prohibited_patterns {
            match Regex::new(pattern) {
                Ok(regex) => extra_rules.push(regex),
                Err(e) => {
                    return Err(SecurityError::new(SecurityErrorKind::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    }));
                }
            }
        }

        Ok(Self {
            config,
            extra_rules,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Clean one string.
    ///
    /// Rules are re-applied until the text stops changing (bounded by
    /// `max_passes`) so that nested fragments cannot reassemble. A field that
    /// still matches a rule after the last pass is emptied. Whitespace is only
    /// tidied when something was removed.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn sanitize_text(&self, text: &str) -> SanitizedText {
        let mut current = text.to_string();
        let mut applied_rules: Vec<String> = Vec::new();

        for _ in 0..self.config.max_passes {
            let before = current.clone();
            for rule in BUILT_IN_RULES.iter() {
                if rule.pattern.is_match(&current) {
                    current = rule.pattern.replace_all(&current, "").into_owned();
                    record(&mut applied_rules, rule.name);
                }
            }
            for (i, regex) in self.extra_rules.iter().enumerate() {
                if regex.is_match(&current) {
                    current = regex.replace_all(&current, "").into_owned();
                    record(&mut applied_rules, &format!("prohibited_pattern_{}", i));
                }
            }
            if current == before {
                break;
            }
        }

        if self.still_unsafe(&current) {
            tracing::warn!(
                max_passes = self.config.max_passes,
                "Unsafe content still reassembles after the last pass; emptying field"
            );
            current.clear();
            record(&mut applied_rules, "unresolved_nesting");
        }

        if !applied_rules.is_empty() {
            current = tidy_whitespace(&current);
            debug!(rules = ?applied_rules, "Removed unsafe content");
        }

        let truncated = current.chars().count() > self.config.max_length;
        if truncated {
            current = current.chars().take(self.config.max_length).collect();
            debug!(max_length = self.config.max_length, "Truncated string field");
        }

        SanitizedText {
            text: current,
            applied_rules,
            truncated,
        }
    }

    fn still_unsafe(&self, text: &str) -> bool {
        let matches = |regex: &Regex| regex.find_iter(text).any(|m| !m.is_empty());
        BUILT_IN_RULES.iter().any(|rule| matches(&rule.pattern))
            || self.extra_rules.iter().any(matches)
    }

    /// Clean every string value in a JSON tree. Object keys are kept as is.
    pub fn sanitize_json(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.sanitize_text(text).into_text()),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.sanitize_json(v)).collect()),
            Value::Object(object) => Value::Object(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), self.sanitize_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Clean the text and mood of every prompt.
    ///
    /// Prompts left with no text are dropped; `None` when none remain.
    #[instrument(skip_all, fields(prompts = doc.len()))]
    pub fn sanitize_storyboard(&self, doc: &StoryboardDocument) -> Option<StoryboardDocument> {
        let prompts: Vec<StoryboardPrompt> = doc
            .prompts()
            .iter()
            .filter_map(|prompt| {
                let text = self.sanitize_text(&prompt.text).into_text();
                if text.trim().is_empty() {
                    debug!("Dropping prompt emptied by sanitization");
                    return None;
                }
                let mood = self.sanitize_text(&prompt.mood).into_text();
                Some(StoryboardPrompt {
                    text,
                    mood: if mood.trim().is_empty() {
                        DEFAULT_MOOD.to_string()
                    } else {
                        mood
                    },
                    ..prompt.clone()
                })
            })
            .collect();

        StoryboardDocument::new(prompts)
    }
}

fn record(applied: &mut Vec<String>, name: &str) {
    if !applied.iter().any(|n| n == name) {
        applied.push(name.to_string());
    }
}

fn tidy_whitespace(text: &str) -> String {
    let collapsed = HORIZONTAL_WHITESPACE.replace_all(text, " ");
    collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .replace(" ,", ",")
        .replace(" .", ".")
}
