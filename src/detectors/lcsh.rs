//! Library of Congress Subject Heading detection.
//!
//! LCSH strings separate heading levels with ` -- `: exactly two hyphens
//! surrounded by single spaces. The surrounding spaces keep em-dashes and
//! ordinary hyphenated words from matching.

use once_cell::sync::Lazy;
use regex::Regex;

const SEPARATOR: &str = " -- ";

static LCSH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S -- \S").unwrap());

/// The separator-delimited heading segments, or `None` when the phrase
/// contains no LCSH separator.
pub fn detect(phrase: &str) -> Option<Vec<String>> {
    if !LCSH.is_match(phrase) {
        return None;
    }

    Some(
        phrase
            .split(SEPARATOR)
            .map(|segment| segment.trim().to_string())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_heading() {
        let segments = detect("united states -- history").unwrap();
        assert_eq!(segments, vec!["united states", "history"]);
    }

    #[test]
    fn test_three_level_heading() {
        let segments = detect("united states -- history -- civil war, 1861-1865").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], "civil war, 1861-1865");
    }

    #[test]
    fn test_hyphenated_word_not_a_separator() {
        assert!(detect("well-known musicians").is_none());
    }

    #[test]
    fn test_em_dash_not_a_separator() {
        assert!(detect("history — civil war").is_none());
    }

    #[test]
    fn test_three_hyphens_not_a_separator() {
        assert!(detect("history --- civil war").is_none());
    }

    #[test]
    fn test_plain_phrase() {
        assert!(detect("civil war history").is_none());
    }
}
