//! Detection ledger.
//!
//! Enforces "at most one detection per (term, detector, version)" through
//! an atomic insert-or-get against the unique index on `detections`. The
//! version tag comes from [`RunContext`], threaded explicitly into every
//! detector and aggregator call — there is no ambient global. Bumping the
//! configured version makes subsequent `record` calls write fresh rows
//! while the old epoch stays behind for audit and metrics.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::Detection;

/// Per-run parameters shared by detectors and the aggregator.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Detector algorithm version tag scoping this run's writes and the
    /// "current" view of detections and categorizations.
    pub version: String,
}

impl RunContext {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

/// Outcome of an insert-or-get, distinguishing a fresh row from one that
/// already existed (e.g. the loser of a concurrent race).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Created,
    Existing,
}

/// Record that `detector_name` fired on `term_id` under the current
/// version. Idempotent: a second call (or a concurrent one) resolves to
/// [`Recorded::Existing`] rather than an error.
pub async fn record_detection(
    pool: &SqlitePool,
    ctx: &RunContext,
    term_id: &str,
    detector_name: &str,
) -> Result<Recorded> {
    let detector_id: Option<String> = sqlx::query_scalar("SELECT id FROM detectors WHERE name = ?")
        .bind(detector_name)
        .fetch_optional(pool)
        .await?;

    let detector_id = detector_id.ok_or_else(|| {
        anyhow::anyhow!(
            "Detector '{}' is not in the catalog; run `tacos init` to seed it",
            detector_name
        )
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO detections (id, term_id, detector_id, detector_version, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(term_id, detector_id, detector_version) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(term_id)
    .bind(&detector_id)
    .bind(&ctx.version)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        Ok(Recorded::Created)
    } else {
        Ok(Recorded::Existing)
    }
}

/// All detections for a term under the current version.
pub async fn current_detections(
    pool: &SqlitePool,
    ctx: &RunContext,
    term_id: &str,
) -> Result<Vec<Detection>> {
    let rows = sqlx::query(
        r#"
        SELECT id, term_id, detector_id, detector_version, created_at
        FROM detections
        WHERE term_id = ? AND detector_version = ?
        ORDER BY created_at
        "#,
    )
    .bind(term_id)
    .bind(&ctx.version)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Detection {
            id: row.get("id"),
            term_id: row.get("term_id"),
            detector_id: row.get("detector_id"),
            detector_version: row.get("detector_version"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Total detections for a term across all versions.
pub async fn detection_count(pool: &SqlitePool, term_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM detections WHERE term_id = ?")
        .bind(term_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
