//! Ordered strategies for pulling a JSON document out of model output.
//!
//! Strategies run strictly in [`ExtractionMethod::in_order`] and stop at the
//! first one that yields a parseable value:
//!
//! 1. **Fence block**: the first ```` ```json ```` block (or the first
//!    fenced block of any kind), parsed strictly.
//! 2. **Regex pattern**: the innermost object enclosing a `prompts`,
//!    `sections` or `scenes` array, parsed strictly and then with the
//!    [`FormatCorrector`].
//! 3. **Bracket match**: successive balanced top-level objects/arrays found
//!    by a string-aware scan, parsed strictly and then corrected.
//!
//! Every strategy that runs is recorded along with why it failed, even when
//! a later strategy succeeds.

use crate::scan::{balanced_end, open_depth, opening_positions};
use crate::{FormatCorrector, ParseError, ParseErrorKind};
use eisenstein_core::ExtractionMethod;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Instant;

/// Confidence of a strictly parsed fenced block.
pub const FENCE_CONFIDENCE: f64 = 0.95;
/// Base confidence of a key-anchored object.
pub const REGEX_CONFIDENCE: f64 = 0.8;
/// Base confidence of a bracket-matched span.
pub const BRACKET_CONFIDENCE: f64 = 0.7;

const MAX_ANCHORS: usize = 8;
const MAX_BRACKET_CANDIDATES: usize = 16;

static STORYBOARD_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\b(prompts|sections|scenes)\b["']?\s*:\s*\["#)
        .expect("storyboard anchor pattern is valid")
});

static FENCE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][\w+-]*$").expect("fence tag pattern is valid"));

/// A successfully extracted JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    /// Parsed value
    data: Value,
    /// Strategy that produced it
    method: ExtractionMethod,
    /// Trust in the value, `[0, 1]`
    confidence: f64,
    /// Wall time spent across all strategies
    processing_time_ms: f64,
    /// Number of strategies that failed first
    retry_count: u32,
}

impl ExtractedDocument {
    /// Take the parsed value.
    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Failure of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct MethodFailure {
    /// Strategy that failed
    method: ExtractionMethod,
    /// Why it failed
    reason: String,
}

/// Result of [`JsonExtractor::extract`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// A strategy produced a document
    Extracted(ExtractedDocument),
    /// Every strategy failed
    Failed(ParseError),
}

impl ExtractionOutcome {
    /// The document, if extraction succeeded.
    pub fn document(&self) -> Option<&ExtractedDocument> {
        match self {
            Self::Extracted(doc) => Some(doc),
            Self::Failed(_) => None,
        }
    }

    /// Consume into the document, if any.
    pub fn into_document(self) -> Option<ExtractedDocument> {
        match self {
            Self::Extracted(doc) => Some(doc),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct AttemptRecord {
    input: Option<String>,
    attempted: Vec<ExtractionMethod>,
    failures: Vec<MethodFailure>,
    last_error: Option<String>,
}

struct Candidate {
    data: Value,
    confidence: f64,
}

/// Runs the extraction strategies and remembers what happened on the last call.
///
/// # Examples
///
/// ```
/// use eisenstein_extract::JsonExtractor;
/// use eisenstein_core::ExtractionMethod;
///
/// let mut extractor = JsonExtractor::default();
/// let doc = extractor
///     .extract_json("Sure:\n```json\n{\"prompts\": [{\"text\": \"A misty pier\"}]}\n```")
///     .unwrap();
///
/// assert_eq!(*doc.method(), ExtractionMethod::FenceBlock);
/// assert_eq!(doc.data()["prompts"][0]["text"], "A misty pier");
/// assert_eq!(*doc.retry_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonExtractor {
    corrector: FormatCorrector,
    record: AttemptRecord,
}

impl JsonExtractor {
    /// Extractor using the given corrector for assisted parses.
    pub fn new(corrector: FormatCorrector) -> Self {
        Self {
            corrector,
            record: AttemptRecord::default(),
        }
    }

    /// Run every strategy in order until one succeeds.
    #[tracing::instrument(skip(self, raw), fields(len = raw.len()))]
    pub fn extract(&mut self, raw: &str) -> ExtractionOutcome {
        let started = Instant::now();
        self.record = AttemptRecord {
            input: Some(raw.to_string()),
            ..AttemptRecord::default()
        };

        for method in ExtractionMethod::in_order() {
            self.record.attempted.push(method);
            let attempt = match method {
                ExtractionMethod::FenceBlock => self.fence_block(raw),
                ExtractionMethod::RegexPattern => self.regex_pattern(raw),
                ExtractionMethod::BracketMatch => self.bracket_match(raw),
            };

            match attempt {
                Ok(candidate) => {
                    let retry_count = u32::try_from(self.record.failures.len()).unwrap_or(u32::MAX);
                    tracing::debug!(%method, confidence = candidate.confidence, retry_count, "Extraction succeeded");
                    return ExtractionOutcome::Extracted(ExtractedDocument {
                        data: candidate.data,
                        method,
                        confidence: candidate.confidence.clamp(0.0, 1.0),
                        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                        retry_count,
                    });
                }
                Err(reason) => {
                    tracing::debug!(%method, %reason, "Extraction strategy failed");
                    self.record.failures.push(MethodFailure { method, reason });
                }
            }
        }

        let error = self.build_parse_error(raw);
        tracing::warn!(kind = %error.kind(), "All extraction strategies failed");
        self.record.last_error = Some(error.message().clone());
        ExtractionOutcome::Failed(error)
    }

    /// [`extract`](Self::extract) projected onto `Option`.
    pub fn extract_json(&mut self, raw: &str) -> Option<ExtractedDocument> {
        self.extract(raw).into_document()
    }

    /// Strategies tried on the last call, in order.
    pub fn attempted_methods(&self) -> &[ExtractionMethod] {
        &self.record.attempted
    }

    /// Strategies that failed on the last call, with reasons.
    pub fn method_failures(&self) -> &[MethodFailure] {
        &self.record.failures
    }

    /// Message describing the last total failure, if the last call failed.
    pub fn last_error(&self) -> Option<&str> {
        self.record.last_error.as_deref()
    }

    /// Diagnose `raw`, re-running extraction unless the last call was on the same text.
    pub fn create_parse_error(&mut self, raw: &str) -> ParseError {
        if self.record.input.as_deref() != Some(raw) {
            let _ = self.extract(raw);
        }
        self.build_parse_error(raw)
    }

    fn build_parse_error(&self, raw: &str) -> ParseError {
        let (kind, message) = classify_failure(raw, &self.record.failures);
        let reasons = self
            .record
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.method, f.reason))
            .collect();
        ParseError::new(kind, message, raw, self.record.attempted.clone(), reasons)
    }

    fn fence_block(&self, raw: &str) -> Result<Candidate, String> {
        let blocks = fence_blocks(raw);
        let block = blocks
            .iter()
            .find(|b| b.tag.eq_ignore_ascii_case("json"))
            .or_else(|| blocks.first())
            .ok_or_else(|| "no fenced code block".to_string())?;

        let body = block.body.trim();
        if body.is_empty() {
            return Err("fenced block is empty".to_string());
        }

        match serde_json::from_str::<Value>(body) {
            Ok(data) => Ok(Candidate {
                data,
                confidence: FENCE_CONFIDENCE,
            }),
            Err(e) if !block.closed => Err(format!("fenced block is never closed: {}", e)),
            Err(e) => Err(format!("fenced block is not valid JSON: {}", e)),
        }
    }

    fn regex_pattern(&self, raw: &str) -> Result<Candidate, String> {
        let braces: Vec<usize> = opening_positions(raw)
            .into_iter()
            .filter(|&p| raw[p..].starts_with('{'))
            .collect();

        let mut last_reason = "no prompts/sections/scenes array found".to_string();
        for anchor in STORYBOARD_ANCHOR.find_iter(raw).take(MAX_ANCHORS) {
            let key_at = anchor.start();
            let enclosing = braces
                .iter()
                .rev()
                .filter(|&&p| p < key_at)
                .find_map(|&p| match balanced_end(raw, p) {
                    Some(end) if end > key_at => Some(Ok((p, end))),
                    Some(_) => None,
                    None => Some(Err(p)),
                });

            let (start, end) = match enclosing {
                Some(Ok(span)) => span,
                Some(Err(p)) => {
                    last_reason = format!("object opened at offset {} is never closed", p);
                    continue;
                }
                None => {
                    last_reason = format!("key at offset {} has no enclosing object", key_at);
                    continue;
                }
            };

            match self.parse_span(&raw[start..end], REGEX_CONFIDENCE) {
                Ok(candidate) => return Ok(candidate),
                Err(reason) => last_reason = reason,
            }
        }
        Err(last_reason)
    }

    fn bracket_match(&self, raw: &str) -> Result<Candidate, String> {
        let mut weak: Option<Candidate> = None;
        let mut last_reason = "no '{' or '[' found".to_string();
        let mut skip_until = 0;
        let mut tried = 0;

        for start in opening_positions(raw) {
            if start < skip_until {
                continue;
            }
            if tried == MAX_BRACKET_CANDIDATES {
                last_reason = format!("gave up after {} candidates: {}", tried, last_reason);
                break;
            }
            let Some(end) = balanced_end(raw, start) else {
                last_reason = format!("bracket at offset {} is never closed", start);
                continue;
            };
            tried += 1;
            skip_until = end;

            match self.parse_span(&raw[start..end], BRACKET_CONFIDENCE) {
                Ok(candidate) if is_structured(&candidate.data) => return Ok(candidate),
                Ok(candidate) => {
                    weak.get_or_insert(candidate);
                }
                Err(reason) => last_reason = reason,
            }
        }
        weak.ok_or(last_reason)
    }

    // Strict parse, then corrector-assisted parse scaled by the corrector's confidence.
    fn parse_span(&self, span: &str, base: f64) -> Result<Candidate, String> {
        let strict_error = match serde_json::from_str::<Value>(span) {
            Ok(data) => {
                return Ok(Candidate {
                    data,
                    confidence: base,
                });
            }
            Err(e) => e,
        };

        let corrected = self.corrector.correct(span);
        if !corrected.was_modified() {
            return Err(format!("candidate is not valid JSON: {}", strict_error));
        }
        serde_json::from_str::<Value>(corrected.corrected())
            .map(|data| Candidate {
                data,
                confidence: base * corrected.confidence(),
            })
            .map_err(|e| {
                format!(
                    "candidate is not valid JSON even after {} correction(s): {}",
                    corrected.applied_corrections().len(),
                    e
                )
            })
    }
}

struct FenceBlock<'a> {
    tag: &'a str,
    body: &'a str,
    closed: bool,
}

fn fence_blocks(raw: &str) -> Vec<FenceBlock<'_>> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(found) = raw[pos..].find("```") {
        let after = pos + found + 3;
        let line_end = raw[after..].find('\n').map_or(raw.len(), |i| after + i);
        let first_line = raw[after..line_end].trim();
        let (tag, body_start) = if first_line.is_empty() || FENCE_TAG.is_match(first_line) {
            (first_line, (line_end + 1).min(raw.len()))
        } else {
            ("", after)
        };

        match raw[body_start..].find("```") {
            Some(close) => {
                blocks.push(FenceBlock {
                    tag,
                    body: &raw[body_start..body_start + close],
                    closed: true,
                });
                pos = body_start + close + 3;
            }
            None => {
                blocks.push(FenceBlock {
                    tag,
                    body: &raw[body_start..],
                    closed: false,
                });
                break;
            }
        }
    }
    blocks
}

fn is_structured(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().any(|v| v.is_object() || v.is_array()),
        _ => false,
    }
}

fn classify_failure(raw: &str, failures: &[MethodFailure]) -> (ParseErrorKind, String) {
    let length = raw.chars().count();
    if raw.trim().is_empty() {
        return (
            ParseErrorKind::EmptyResponse,
            format!("Model response is empty ({} characters of whitespace)", length),
        );
    }
    if opening_positions(raw).is_empty() {
        return (
            ParseErrorKind::NoJsonFound,
            format!("No JSON-like structure found in {} characters of model output", length),
        );
    }

    let unclosed = open_depth(raw);
    if unclosed > 0 {
        return (
            ParseErrorKind::Truncated,
            format!(
                "Model output appears truncated: {} bracket(s) never closed in {} characters",
                unclosed, length
            ),
        );
    }
    if raw.matches("```").count() % 2 == 1 {
        return (
            ParseErrorKind::Truncated,
            format!("Model output appears truncated: a code fence is never closed ({} characters)", length),
        );
    }

    let detail = failures
        .last()
        .map(|f| f.reason.as_str())
        .unwrap_or("no strategy produced a value");
    (
        ParseErrorKind::MalformedJson,
        format!("JSON-like text found but could not be parsed: {}", detail),
    )
}
