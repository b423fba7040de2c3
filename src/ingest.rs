//! Search-event ingestion.
//!
//! The single entry point contributing systems call: look up or create the
//! term (computing its fingerprint on first observation), run the full
//! detection-and-categorization pipeline, then log the event itself.

use anyhow::{bail, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::categorize::{calculate_categorizations, CategorizationOutcome};
use crate::config::Config;
use crate::fingerprint::fingerprint;
use crate::ledger::RunContext;
use crate::models::{SearchEvent, Term};

pub async fn log_event(
    pool: &SqlitePool,
    config: &Config,
    ctx: &RunContext,
    phrase: &str,
    source: &str,
) -> Result<(SearchEvent, CategorizationOutcome)> {
    let term = find_or_create_term(pool, phrase).await?;
    let outcome = calculate_categorizations(pool, config, ctx, &term).await?;

    let event = SearchEvent {
        id: Uuid::new_v4().to_string(),
        term_id: term.id.clone(),
        source: source.to_string(),
        occurred_at: Utc::now().timestamp(),
    };

    sqlx::query("INSERT INTO search_events (id, term_id, source, occurred_at) VALUES (?, ?, ?, ?)")
        .bind(&event.id)
        .bind(&event.term_id)
        .bind(&event.source)
        .bind(event.occurred_at)
        .execute(pool)
        .await?;

    Ok((event, outcome))
}

/// Look up a term by its exact phrase, creating it (and its fingerprint
/// row) on first observation. Safe under concurrent callers: both inserts
/// race through unique indexes and the survivor is read back.
///
/// Blank phrases are rejected here, the shared entry point, so no caller
/// can create a junk term or run detectors against one.
pub async fn find_or_create_term(pool: &SqlitePool, phrase: &str) -> Result<Term> {
    if phrase.trim().is_empty() {
        bail!("Cannot classify a blank search phrase");
    }

    if let Some(term) = fetch_term(pool, phrase).await? {
        return Ok(term);
    }

    let fingerprint_id = find_or_create_fingerprint(pool, phrase).await?;

    sqlx::query(
        r#"
        INSERT INTO terms (id, phrase, fingerprint_id, flagged, created_at)
        VALUES (?, ?, ?, 0, ?)
        ON CONFLICT(phrase) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(phrase)
    .bind(&fingerprint_id)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    fetch_term(pool, phrase)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Term vanished after insert: {}", phrase))
}

async fn fetch_term(pool: &SqlitePool, phrase: &str) -> Result<Option<Term>> {
    let row = sqlx::query(
        "SELECT id, phrase, fingerprint_id, flagged, created_at FROM terms WHERE phrase = ?",
    )
    .bind(phrase)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Term {
        id: row.get("id"),
        phrase: row.get("phrase"),
        fingerprint_id: row.get("fingerprint_id"),
        flagged: row.get::<i64, _>("flagged") != 0,
        created_at: row.get("created_at"),
    }))
}

/// Returns `None` for phrases whose canonical form is empty (e.g. pure
/// punctuation) — such terms simply carry no fingerprint.
async fn find_or_create_fingerprint(pool: &SqlitePool, phrase: &str) -> Result<Option<String>> {
    let value = fingerprint(phrase);
    if value.is_empty() {
        return Ok(None);
    }

    sqlx::query("INSERT INTO fingerprints (id, value) VALUES (?, ?) ON CONFLICT(value) DO NOTHING")
        .bind(Uuid::new_v4().to_string())
        .bind(&value)
        .execute(pool)
        .await?;

    let id: String = sqlx::query_scalar("SELECT id FROM fingerprints WHERE value = ?")
        .bind(&value)
        .fetch_one(pool)
        .await?;

    Ok(Some(id))
}
