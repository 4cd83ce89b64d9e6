//! Scene timestamps in the `MM:SS` wire format.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Offset of a scene from the start of the piece, rendered as zero-padded `MM:SS`.
///
/// # Examples
///
/// ```
/// use eisenstein_core::Timestamp;
///
/// let ts: Timestamp = "00:15".parse().unwrap();
/// assert_eq!(ts.total_seconds(), 15);
/// assert_eq!(ts.to_string(), "00:15");
///
/// // Lenient parsing normalises the shapes models like to emit.
/// assert_eq!(Timestamp::parse_lenient("1:05").unwrap().to_string(), "01:05");
/// assert_eq!(Timestamp::parse_lenient("90s").unwrap().to_string(), "01:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Timestamp from a number of seconds.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Seconds since the start.
    pub fn total_seconds(&self) -> u32 {
        self.0
    }

    /// Minutes component.
    pub fn minutes(&self) -> u32 {
        self.0 / 60
    }

    /// Seconds component.
    pub fn seconds(&self) -> u32 {
        self.0 % 60
    }

    /// Timestamp for the `index`-th scene when scenes are `spacing` seconds apart.
    pub fn sequential(index: usize, spacing: u32) -> Self {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        Self(index.saturating_mul(spacing))
    }

    /// Strict check for the wire format: two or more minute digits, two second digits.
    pub fn is_well_formed(text: &str) -> bool {
        let Some((minutes, seconds)) = text.split_once(':') else {
            return false;
        };
        minutes.len() >= 2
            && seconds.len() == 2
            && minutes.chars().all(|c| c.is_ascii_digit())
            && seconds.chars().all(|c| c.is_ascii_digit())
            && seconds.parse::<u32>().is_ok_and(|s| s < 60)
    }

    /// Accepts `MM:SS`, `M:SS`, `HH:MM:SS`, bare seconds and a trailing `s`.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let parts: Vec<&str> = text.split(':').map(str::trim).collect();
        let numbers: Option<Vec<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();

        match (parts.len(), numbers) {
            (1, _) => {
                let bare = text.strip_suffix('s').unwrap_or(text).trim();
                let seconds = bare.parse::<f64>().ok()?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return None;
                }
                Some(Self(seconds.round() as u32))
            }
            (2, Some(n)) if n[1] < 60 => Some(Self(n[0].saturating_mul(60).saturating_add(n[1]))),
            (3, Some(n)) if n[1] < 60 && n[2] < 60 => Some(Self(
                n[0].saturating_mul(3600)
                    .saturating_add(n[1] * 60)
                    .saturating_add(n[2]),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes(), self.seconds())
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_well_formed(s) {
            return Err(format!("'{}' is not a MM:SS timestamp", s));
        }
        Self::parse_lenient(s).ok_or_else(|| format!("'{}' is not a MM:SS timestamp", s))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse_lenient(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_format() {
        assert!(Timestamp::is_well_formed("00:15"));
        assert!(Timestamp::is_well_formed("12:59"));
        assert!(!Timestamp::is_well_formed("0:15"));
        assert!(!Timestamp::is_well_formed("00:60"));
        assert!(!Timestamp::is_well_formed("00-15"));
        assert!("1:5".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_lenient_shapes() {
        assert_eq!(Timestamp::parse_lenient("0:07").unwrap().total_seconds(), 7);
        assert_eq!(Timestamp::parse_lenient("01:02:03").unwrap().to_string(), "62:03");
        assert_eq!(Timestamp::parse_lenient("42").unwrap().to_string(), "00:42");
        assert!(Timestamp::parse_lenient("soon").is_none());
        assert!(Timestamp::parse_lenient("1:75").is_none());
    }

    #[test]
    fn test_sequential_spacing() {
        assert_eq!(Timestamp::sequential(0, 5).to_string(), "00:00");
        assert_eq!(Timestamp::sequential(13, 5).to_string(), "01:05");
    }
}
