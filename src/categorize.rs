//! Categorization aggregator.
//!
//! Turns the evidence in the detection ledger into per-category confidence
//! scores. Every detector is run first (idempotently), then the current
//! detections fan out through the detector→category weight table, and each
//! category's contributions are averaged. The resulting rows are
//! append-only per (term, category, confidence, version): re-running with
//! unchanged inputs creates nothing, while a version bump or a weight
//! change appends new rows and leaves history in place.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::Config;
use crate::detectors::{self, DetectorKind};
use crate::ledger::RunContext;
use crate::models::{Categorization, Term};

/// Result of one aggregation run: the categorizations now current for the
/// term, plus any detectors that failed along the way (the run continues
/// with partial evidence).
#[derive(Debug)]
pub struct CategorizationOutcome {
    pub categorizations: Vec<Categorization>,
    pub failures: Vec<(DetectorKind, anyhow::Error)>,
}

pub async fn calculate_categorizations(
    pool: &SqlitePool,
    config: &Config,
    ctx: &RunContext,
    term: &Term,
) -> Result<CategorizationOutcome> {
    let failures = detectors::record_all(pool, config, ctx, term).await;

    // Expand current detections through the weight edges. A detector with
    // no weight rows contributes no categories, which is not an error.
    let rows = sqlx::query(
        r#"
        SELECT dc.category_id, dc.confidence
        FROM detections d
        JOIN detector_categories dc ON dc.detector_id = d.detector_id
        WHERE d.term_id = ? AND d.detector_version = ?
        "#,
    )
    .bind(&term.id)
    .bind(&ctx.version)
    .fetch_all(pool)
    .await?;

    let mut by_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let category_id: String = row.get("category_id");
        let confidence: f64 = row.get("confidence");
        by_category.entry(category_id).or_default().push(confidence);
    }

    let mut categorizations = Vec::new();
    for (category_id, confidences) in by_category {
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        let confidence = round2(mean);
        let row = upsert_categorization(pool, ctx, &term.id, &category_id, confidence).await?;
        categorizations.push(row);
    }

    Ok(CategorizationOutcome {
        categorizations,
        failures,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Find-or-create on the full (term, category, confidence, version) key.
/// The unique index absorbs concurrent duplicates; the surviving row is
/// read back either way.
async fn upsert_categorization(
    pool: &SqlitePool,
    ctx: &RunContext,
    term_id: &str,
    category_id: &str,
    confidence: f64,
) -> Result<Categorization> {
    sqlx::query(
        r#"
        INSERT INTO categorizations (id, term_id, category_id, confidence, detector_version, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(term_id, category_id, confidence, detector_version) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(term_id)
    .bind(category_id)
    .bind(confidence)
    .bind(&ctx.version)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    let row = sqlx::query(
        r#"
        SELECT id, term_id, category_id, confidence, detector_version, created_at
        FROM categorizations
        WHERE term_id = ? AND category_id = ? AND confidence = ? AND detector_version = ?
        "#,
    )
    .bind(term_id)
    .bind(category_id)
    .bind(confidence)
    .bind(&ctx.version)
    .fetch_one(pool)
    .await?;

    Ok(Categorization {
        id: row.get("id"),
        term_id: row.get("term_id"),
        category_id: row.get("category_id"),
        confidence: row.get("confidence"),
        detector_version: row.get("detector_version"),
        created_at: row.get("created_at"),
    })
}

/// Current categorizations for a term with their category names resolved,
/// for display.
pub async fn current_categorizations(
    pool: &SqlitePool,
    ctx: &RunContext,
    term_id: &str,
) -> Result<Vec<(String, f64)>> {
    let rows = sqlx::query(
        r#"
        SELECT c.name, z.confidence
        FROM categorizations z
        JOIN categories c ON c.id = z.category_id
        WHERE z.term_id = ? AND z.detector_version = ?
        ORDER BY z.confidence DESC, c.name
        "#,
    )
    .bind(term_id)
    .bind(&ctx.version)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("name"), row.get("confidence")))
        .collect())
}
