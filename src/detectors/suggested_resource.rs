//! Curated suggested-resource matching.
//!
//! Two mechanisms share this module: exact fingerprint lookup against the
//! `suggested_resources` table, and an admin-curated list of regex rules
//! in `suggested_resource_patterns`. Resource fingerprints are computed
//! with [`resource_fingerprint`], the normalizer variant without the
//! `&quot;` substitution, and the table enforces their uniqueness, so the
//! exact lookup yields zero or one row.

use anyhow::Result;
use regex::Regex;
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::fingerprint::resource_fingerprint;
use crate::models::{SuggestedResource, SuggestedResourcePattern};

pub async fn detect(pool: &SqlitePool, phrase: &str) -> Result<Option<SuggestedResource>> {
    let value = resource_fingerprint(phrase);
    if value.is_empty() {
        return Ok(None);
    }

    let row = sqlx::query(
        "SELECT id, title, url, fingerprint FROM suggested_resources WHERE fingerprint = ?",
    )
    .bind(&value)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| SuggestedResource {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        fingerprint: row.get("fingerprint"),
    }))
}

/// All pattern rules the phrase matches. A phrase may hit several rules;
/// the recording layer still writes a single detection.
pub async fn detect_patterns(
    pool: &SqlitePool,
    phrase: &str,
) -> Result<Vec<SuggestedResourcePattern>> {
    let rows = sqlx::query(
        "SELECT id, pattern, title, url, shortcode FROM suggested_resource_patterns ORDER BY shortcode",
    )
    .fetch_all(pool)
    .await?;

    let mut matches = Vec::new();
    for row in rows {
        let rule = SuggestedResourcePattern {
            id: row.get("id"),
            pattern: row.get("pattern"),
            title: row.get("title"),
            url: row.get("url"),
            shortcode: row.get("shortcode"),
        };

        // Rules are admin-entered free text; a bad pattern disables that
        // rule, not the detector.
        match Regex::new(&rule.pattern) {
            Ok(regex) => {
                if regex.is_match(phrase) {
                    matches.push(rule);
                }
            }
            Err(error) => {
                warn!(shortcode = %rule.shortcode, %error, "skipping invalid suggested-resource pattern");
            }
        }
    }

    Ok(matches)
}
