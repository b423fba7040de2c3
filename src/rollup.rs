//! Identifier match-count rollup.
//!
//! A batch fold over one calendar month of search events: each event's
//! phrase is run through the StandardIdentifiers detector fresh (the
//! ledger is deliberately bypassed so the tallies reflect the current
//! algorithm, not whichever version recorded the detection), and the
//! counts land in one `monthly_matches` row per period. The period is an
//! idempotency key: re-running a month replaces its row.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::detectors::identifiers;
use crate::models::MatchCounts;

pub async fn run_rollup(pool: &SqlitePool, period: Option<String>) -> Result<(String, MatchCounts)> {
    let requested = period.unwrap_or_else(|| Utc::now().format("%Y-%m").to_string());
    let (period, start, end) = period_bounds(&requested)?;

    let phrases: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT t.phrase
        FROM search_events e
        JOIN terms t ON t.id = e.term_id
        WHERE e.occurred_at >= ? AND e.occurred_at < ?
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    let counts = phrases
        .iter()
        .fold(MatchCounts::default(), |counts, phrase| {
            classify(counts, phrase)
        });

    sqlx::query(
        r#"
        INSERT INTO monthly_matches (id, period, doi, isbn, issn, pmid, unmatched, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(period) DO UPDATE SET
            doi = excluded.doi,
            isbn = excluded.isbn,
            issn = excluded.issn,
            pmid = excluded.pmid,
            unmatched = excluded.unmatched,
            created_at = excluded.created_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&period)
    .bind(counts.doi)
    .bind(counts.isbn)
    .bind(counts.issn)
    .bind(counts.pmid)
    .bind(counts.unmatched)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok((period, counts))
}

/// Tally one event. A phrase carrying several identifier kinds counts
/// toward each of them; a phrase carrying none counts as unmatched.
fn classify(mut counts: MatchCounts, phrase: &str) -> MatchCounts {
    let findings = identifiers::detect(phrase);

    if findings.is_empty() {
        counts.unmatched += 1;
        return counts;
    }

    if findings.doi.is_some() {
        counts.doi += 1;
    }
    if findings.isbn.is_some() {
        counts.isbn += 1;
    }
    if findings.issn.is_some() {
        counts.issn += 1;
    }
    if findings.pmid.is_some() {
        counts.pmid += 1;
    }

    counts
}

/// Canonical `YYYY-MM` period plus the half-open UTC timestamp range
/// [start, end) it covers.
///
/// The stored period is re-formatted from the parsed date rather than
/// taken verbatim: chrono accepts unpadded months ("2025-1"), and storing
/// the raw input would split one month across two rows behind the
/// UNIQUE(period) key.
fn period_bounds(period: &str) -> Result<(String, i64, i64)> {
    let start_date = NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d")
        .with_context(|| format!("Invalid rollup period '{}'; expected YYYY-MM", period))?;

    let (next_year, next_month) = if start_date.month() == 12 {
        (start_date.year() + 1, 1)
    } else {
        (start_date.year(), start_date.month() + 1)
    };
    let end_date = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .context("Could not compute end of rollup period")?;

    let to_ts = |d: NaiveDate| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    Ok((
        start_date.format("%Y-%m").to_string(),
        to_ts(start_date),
        to_ts(end_date),
    ))
}
