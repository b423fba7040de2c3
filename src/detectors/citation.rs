//! Heuristic citation scorer.
//!
//! A phrase pasted from a bibliography tends to carry several structural
//! tells at once: volume(issue) pairs, page ranges, a parenthetical year,
//! comma-separated surnames, dense punctuation. No single signal is
//! reliable, so the score sums two families:
//!
//! - subpattern hits: how many *distinct* pattern types matched (an
//!   occurrence count per type is kept for the ML feature vector, but a
//!   type contributes at most 1 to the score);
//! - summary hits: how many summary statistics met their threshold.
//!
//! A phrase counts as a citation when the combined score reaches the
//! configured threshold (default 6).

use once_cell::sync::Lazy;
use regex::Regex;

/// APA-style volume(issue), e.g. `12(3)`.
static APA_VOLUME_ISSUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\(\d+\)").unwrap());
static NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"no\.\s\d+").unwrap());
/// Unspaced page ranges, e.g. `361-367`.
static PAGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+-\d+").unwrap());
static PP: Lazy<Regex> = Lazy::new(|| Regex::new(r"pp\.\s\d+").unwrap());
static VOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"vol\.\s\d+").unwrap());
/// A four-digit year in parentheses.
static YEAR_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d{4}\)").unwrap());
static BRACKETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());
/// Capitalized word followed by a period or comma; crude surname signal.
static LASTNAMES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][a-z]+[.,]").unwrap());
/// Paired HTML-entity-quoted phrases, as logged by the front end.
static QUOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"&quot;.+?&quot;").unwrap());

/// Occurrence counts per subpattern plus raw summary statistics.
///
/// Field names double as the wire names sent to the ML oracle (with the
/// renames applied there, not here).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationFeatures {
    pub apa_volume_issue: usize,
    pub no: usize,
    pub pages: usize,
    pub pp: usize,
    pub vol: usize,
    pub year_parens: usize,
    pub brackets: usize,
    pub lastnames: usize,
    pub quotes: usize,
    pub characters: usize,
    pub colons: usize,
    pub commas: usize,
    pub periods: usize,
    pub semicolons: usize,
    pub words: usize,
}

pub fn features(phrase: &str) -> CitationFeatures {
    CitationFeatures {
        apa_volume_issue: APA_VOLUME_ISSUE.find_iter(phrase).count(),
        no: NO.find_iter(phrase).count(),
        pages: PAGES.find_iter(phrase).count(),
        pp: PP.find_iter(phrase).count(),
        vol: VOL.find_iter(phrase).count(),
        year_parens: YEAR_PARENS.find_iter(phrase).count(),
        brackets: BRACKETS.find_iter(phrase).count(),
        lastnames: LASTNAMES.find_iter(phrase).count(),
        quotes: QUOTES.find_iter(phrase).count(),
        characters: phrase.chars().count(),
        colons: phrase.matches(':').count(),
        commas: phrase.matches(',').count(),
        periods: phrase.matches('.').count(),
        semicolons: phrase.matches(';').count(),
        words: phrase.split_whitespace().count(),
    }
}

/// Combined score: distinct subpattern types matched plus summary
/// thresholds met.
pub fn score(f: &CitationFeatures) -> u32 {
    let subpatterns = [
        f.apa_volume_issue,
        f.no,
        f.pages,
        f.pp,
        f.vol,
        f.year_parens,
        f.brackets,
        f.lastnames,
        f.quotes,
    ];
    let subpattern_hits = subpatterns.iter().filter(|count| **count > 0).count() as u32;

    let summary_hits = [
        f.characters >= 25,
        f.colons >= 2,
        f.commas >= 2,
        f.periods >= 2,
        f.semicolons >= 2,
        f.words >= 5,
    ]
    .iter()
    .filter(|hit| **hit)
    .count() as u32;

    subpattern_hits + summary_hits
}

pub fn detect(phrase: &str, threshold: u32) -> bool {
    score(&features(phrase)) >= threshold
}
