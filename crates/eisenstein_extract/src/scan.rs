//! String-aware scanning shared by the corrector and the extractor.

/// Tracks whether a left-to-right scan is inside a double-quoted string.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct QuoteTracker {
    in_string: bool,
    escaped: bool,
}

impl QuoteTracker {
    /// Feed one character. Returns true when it belongs to a string literal,
    /// quotes included.
    pub(crate) fn step(&mut self, ch: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            true
        } else if ch == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn in_string(&self) -> bool {
        self.in_string
    }
}

/// Byte offset one past the bracket closing the one at `start`.
///
/// `start` must point at `{` or `[`. Brackets inside strings are ignored and
/// mismatched closers end the scan.
pub(crate) fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let tail = text.get(start..)?;
    if !tail.starts_with(['{', '[']) {
        return None;
    }

    let mut tracker = QuoteTracker::default();
    let mut stack: Vec<char> = Vec::new();
    for (offset, ch) in tail.char_indices() {
        if tracker.step(ch) {
            continue;
        }
        match ch {
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Opening brackets minus closing brackets outside strings.
pub(crate) fn open_depth(text: &str) -> i64 {
    let mut tracker = QuoteTracker::default();
    let mut depth = 0i64;
    for ch in text.chars() {
        if tracker.step(ch) {
            continue;
        }
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Byte offsets of every `{` or `[` outside strings.
pub(crate) fn opening_positions(text: &str) -> Vec<usize> {
    let mut tracker = QuoteTracker::default();
    text.char_indices()
        .filter(|&(_, ch)| !tracker.step(ch) && (ch == '{' || ch == '['))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_ignores_brackets_in_strings() {
        let text = r#"noise {"a": "}{", "b": [1, {"c": 2}]} tail"#;
        let start = text.find('{').unwrap();
        let end = balanced_end(text, start).unwrap();
        assert_eq!(&text[start..end], r#"{"a": "}{", "b": [1, {"c": 2}]}"#);
    }

    #[test]
    fn test_balanced_handles_escaped_quotes() {
        let text = r#"{"a": "say \"hi\" }"}"#;
        assert_eq!(balanced_end(text, 0), Some(text.len()));
    }

    #[test]
    fn test_unbalanced_and_mismatched() {
        assert_eq!(balanced_end(r#"{"a": [1, 2"#, 0), None);
        assert_eq!(balanced_end(r#"{"a": [1, 2}"#, 0), None);
        assert_eq!(open_depth(r#"{"a": [1, 2"#), 2);
    }

    #[test]
    fn test_opening_positions_skip_strings() {
        assert_eq!(opening_positions(r#"{"x": "[" , "y": []}"#), vec![0, 17]);
    }
}
