//! Journal name detection against the registry.
//!
//! Exact matching lowercases the phrase and looks it up directly; journal
//! names are stored lowercase, and duplicate names are tolerated, so zero
//! or more rows can come back.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::models::Journal;

pub async fn detect(pool: &SqlitePool, phrase: &str) -> Result<Vec<Journal>> {
    let rows = sqlx::query("SELECT id, name FROM journals WHERE name = ?")
        .bind(phrase.trim().to_lowercase())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Journal {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

/// Journals whose name appears somewhere inside the phrase.
///
/// Scans the entire registry, so it does not scale with the journal table;
/// it is exposed only through the manual-inspection CLI path and never
/// records detections.
pub async fn detect_partial(pool: &SqlitePool, phrase: &str) -> Result<Vec<Journal>> {
    let needle = phrase.trim().to_lowercase();

    let rows = sqlx::query("SELECT id, name FROM journals")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Journal {
            id: row.get("id"),
            name: row.get("name"),
        })
        .filter(|journal| needle.contains(&journal.name))
        .collect())
}
