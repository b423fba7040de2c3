//! Standard identifier detection: DOI, ISBN, ISSN, PMID.
//!
//! Four independent regexes applied to the raw phrase, first match only
//! per pattern. A phrase containing two ISSNs reports only the first;
//! callers needing exhaustive extraction should not use this detector.
//! ISSN candidates are additionally validated against the mod-11 check
//! digit and rejected on mismatch.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hyphen- or space-delimited 10/13-digit forms, optional "ISBN" prefix,
/// 'X' accepted as the check character.
static ISBN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:ISBN[-:]?\s?)?((?:97[89][-\s])?\d{1,5}[-\s]\d{1,7}[-\s]\d{1,6}[-\s][\dX])\b")
        .unwrap()
});

static ISSN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}-\d{3}[\dXx]\b").unwrap());

/// Literal "pmid:" prefix (case-insensitive) followed by 7-8 digits.
static PMID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpmid:\s?(\d{7,8})\b").unwrap());

/// "10." prefix, dot-delimited numeric segments, a slash, and a
/// non-whitespace suffix.
static DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b10\.\d+(?:\.\d+)*/\S+").unwrap());

/// First match per identifier pattern, as found in the phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierFindings {
    pub doi: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub pmid: Option<String>,
}

impl IdentifierFindings {
    pub fn is_empty(&self) -> bool {
        self.doi.is_none() && self.isbn.is_none() && self.issn.is_none() && self.pmid.is_none()
    }

    /// Catalog names of the detectors that matched, in seed order.
    pub fn matched_detectors(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.doi.is_some() {
            names.push("DOI");
        }
        if self.isbn.is_some() {
            names.push("ISBN");
        }
        if self.issn.is_some() {
            names.push("ISSN");
        }
        if self.pmid.is_some() {
            names.push("PMID");
        }
        names
    }
}

pub fn detect(phrase: &str) -> IdentifierFindings {
    IdentifierFindings {
        doi: DOI.find(phrase).map(|m| m.as_str().to_string()),
        isbn: ISBN
            .captures(phrase)
            .map(|c| c.get(1).unwrap().as_str().to_string()),
        issn: ISSN
            .find(phrase)
            .map(|m| m.as_str())
            .filter(|candidate| valid_issn_checksum(candidate))
            .map(|s| s.to_string()),
        pmid: PMID
            .captures(phrase)
            .map(|c| c.get(1).unwrap().as_str().to_string()),
    }
}

/// ISSN check-digit validation: strip the hyphen, weight the first seven
/// digits 8 down to 2, checksum = (11 - sum mod 11) mod 11, with 10
/// written as 'X'. The candidate is rejected when the computed checksum
/// disagrees with its eighth character.
fn valid_issn_checksum(candidate: &str) -> bool {
    let digits: Vec<char> = candidate.chars().filter(|c| *c != '-').collect();
    if digits.len() != 8 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, c) in digits[..7].iter().enumerate() {
        let value = match c.to_digit(10) {
            Some(v) => v,
            None => return false,
        };
        sum += value * (8 - i as u32);
    }

    let check = (11 - sum % 11) % 11;
    let expected = if check == 10 {
        'X'
    } else {
        char::from_digit(check, 10).unwrap()
    };

    digits[7].to_ascii_uppercase() == expected
}
