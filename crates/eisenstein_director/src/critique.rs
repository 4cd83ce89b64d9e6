//! Reading a quality score out of critique tool output.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// JSON keys checked for a score, in order.
pub const SCORE_KEYS: &[&str] = &["score", "quality_score", "overall_score", "rating"];

static LABELLED_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:overall\s+)?(?:quality\s+)?(?:score|rating)\b[^0-9\n]{0,20}?(\d+(?:\.\d+)?)\s*(?:(?:/|out\s+of)\s*(\d+(?:\.\d+)?))?",
    )
    .expect("labelled score pattern is valid")
});

static RATIO_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:/|out\s+of)\s*(\d+(?:\.\d+)?)")
        .expect("ratio score pattern is valid")
});

/// Quality score in `[0, 1]`, or `None` when the output holds no usable score.
///
/// JSON objects are searched for [`SCORE_KEYS`] (numbers or numeric
/// strings). Text is searched for `score: 8/10`, `7.5 out of 10`, or a
/// bare number. Values without a denominator are read as a fraction when
/// at most 1, a ten-point scale up to 10, and a percentage up to 100.
///
/// # Examples
///
/// ```
/// use eisenstein_director::parse_quality_score;
///
/// assert_eq!(parse_quality_score(r#"{"score": 0.82}"#), Some(0.82));
/// assert_eq!(parse_quality_score("Overall score: 8/10. Tighten scene 3."), Some(0.8));
/// assert_eq!(parse_quality_score("85"), Some(0.85));
/// assert_eq!(parse_quality_score("Looks great!"), None);
/// ```
pub fn parse_quality_score(output: &str) -> Option<f64> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(score) = score_from_json(&value) {
            return Some(score);
        }
    }

    if let Some(caps) = LABELLED_SCORE.captures(trimmed) {
        let value = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let scale = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let Some(score) = value.and_then(|v| normalize(v, scale)) {
            return Some(score);
        }
    }

    if let Some(caps) = RATIO_SCORE.captures(trimmed) {
        let value = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let scale = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let Some(score) = value.and_then(|v| normalize(v, scale)) {
            return Some(score);
        }
    }

    trimmed
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .and_then(|v| normalize(v, None))
}

fn score_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(|v| normalize(v, None)),
        Value::Object(map) => SCORE_KEYS.iter().find_map(|key| {
            let raw = match map.get(*key)? {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
                _ => return None,
            };
            normalize(raw, None)
        }),
        _ => None,
    }
}

fn normalize(value: f64, scale: Option<f64>) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let score = match scale {
        Some(scale) if scale > 0.0 => value / scale,
        Some(_) => return None,
        None if value <= 1.0 => value,
        None if value <= 10.0 => value / 10.0,
        None if value <= 100.0 => value / 100.0,
        None => return None,
    };
    Some(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keys_and_scales() {
        assert_eq!(parse_quality_score(r#"{"quality_score": 7}"#), Some(0.7));
        assert_eq!(parse_quality_score(r#"{"rating": "90"}"#), Some(0.9));
        assert_eq!(parse_quality_score(r#"{"notes": "fine"}"#), None);
        assert_eq!(parse_quality_score("0.6"), Some(0.6));
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(parse_quality_score("Rating - 3 out of 4"), Some(0.75));
        assert_eq!(parse_quality_score("I'd give this 6/8 overall"), Some(0.75));
        assert_eq!(parse_quality_score("Quality score: 72%"), Some(0.72));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(parse_quality_score("Score: 450"), None);
        assert_eq!(parse_quality_score("Score: 5/0"), None);
        assert_eq!(parse_quality_score("Score: 12/10"), Some(1.0));
    }
}
