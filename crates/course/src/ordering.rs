//! Ordering keys: the digit strings that tie supplementary files to lessons.
//!
//! Correlating files by a leading number is a heuristic. Two lessons named
//! `1_a` and `1_b` share a key, and a file named `10_x` never belongs to lesson
//! `1`. Callers that need something stronger can supply their own
//! [`OrderingKeyPolicy`].

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Digit string extracted from a file name. Compared verbatim, so `01` and
/// `1` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderingKey(String);

impl OrderingKey {
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives an ordering key from a base name (no extension).
pub trait OrderingKeyPolicy: Send + Sync {
    fn key_of(&self, name: &str) -> Option<OrderingKey>;
}

static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("leading digits regex compiles"));
static FIRST_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*(\d+)").expect("first digits regex compiles"));

/// Default policy: digits at the very start of the name, otherwise the first
/// run of digits after a non-digit prefix (`Lecture 01 - Topic` gives `01`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitPrefixPolicy;

impl OrderingKeyPolicy for DigitPrefixPolicy {
    fn key_of(&self, name: &str) -> Option<OrderingKey> {
        [&*LEADING_DIGITS, &*FIRST_DIGITS]
            .iter()
            .find_map(|re| re.captures(name))
            .and_then(|caps| caps.get(1))
            .map(|m| OrderingKey::new(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Option<String> {
        DigitPrefixPolicy.key_of(name).map(|k| k.as_str().to_string())
    }

    #[test]
    fn test_leading_digits() {
        assert_eq!(key("01_intro").as_deref(), Some("01"));
        assert_eq!(key("010_extra").as_deref(), Some("010"));
        assert_eq!(key("7").as_deref(), Some("7"));
    }

    #[test]
    fn test_digits_after_prefix() {
        assert_eq!(key("Lecture 01 - Topic").as_deref(), Some("01"));
        assert_eq!(key("lesson3part2").as_deref(), Some("3"));
    }

    #[test]
    fn test_no_digits() {
        assert_eq!(key("intro_handout"), None);
        assert_eq!(key(""), None);
    }

    #[test]
    fn test_keys_compare_verbatim() {
        assert_ne!(DigitPrefixPolicy.key_of("01_a"), DigitPrefixPolicy.key_of("1_a"));
        assert_ne!(DigitPrefixPolicy.key_of("01_a"), DigitPrefixPolicy.key_of("010_a"));
    }
}
