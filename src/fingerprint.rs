//! Fingerprint normalizer.
//!
//! Reduces a phrase to a canonical token-set form so that phrases differing
//! only in word order, case, punctuation, or diacritics compare equal. This
//! canonical string is the fuzzy-match key for suggested resources and the
//! value stored in the `fingerprints` table.
//!
//! The pipeline is strictly ordered and idempotent:
//! trim → lowercase → (`&quot;` → `"`) → strip punctuation/symbols →
//! ASCII-fold → strip again → tokenize → dedupe → sort → join.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Unicode punctuation and symbol characters, stripped twice: once before
/// transliteration and once after (transliteration can introduce new ones).
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{P}\p{S}]").unwrap());

/// Canonical fingerprint of a search phrase.
///
/// The `&quot;` entity is rewritten to a real quote before punctuation
/// stripping so it vanishes entirely; otherwise its letters would survive
/// as a stray `quot` token.
pub fn fingerprint(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let unquoted = lowered.replace("&quot;", "\"");
    normalize(&unquoted)
}

/// Fingerprint variant for suggested-resource phrases.
///
/// Identical to [`fingerprint`] except the `&quot;` substitution is
/// skipped. The asymmetry is intentional and load-bearing: resource
/// fingerprints were computed without it, and changing either side would
/// silently break existing matches.
pub fn resource_fingerprint(text: &str) -> String {
    normalize(&text.trim().to_lowercase())
}

fn normalize(text: &str) -> String {
    let stripped = PUNCTUATION.replace_all(text, "");
    let folded = deunicode(&stripped);
    let stripped = PUNCTUATION.replace_all(&folded, "");

    let tokens: BTreeSet<&str> = stripped.split_whitespace().collect();
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}
