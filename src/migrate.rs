use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    seed_catalog(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and the unique indexes that back the idempotency
/// contracts. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fingerprints (
            id TEXT PRIMARY KEY,
            value TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Deleting a fingerprint must not invalidate its terms (SET NULL);
    // deleting a term cascades to everything derived from it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS terms (
            id TEXT PRIMARY KEY,
            phrase TEXT NOT NULL UNIQUE,
            fingerprint_id TEXT,
            flagged INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (fingerprint_id) REFERENCES fingerprints(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS detectors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS detector_categories (
            id TEXT PRIMARY KEY,
            detector_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            confidence REAL NOT NULL,
            UNIQUE(detector_id, category_id),
            FOREIGN KEY (detector_id) REFERENCES detectors(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS detections (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL,
            detector_id TEXT NOT NULL,
            detector_version TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(term_id, detector_id, detector_version),
            FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE,
            FOREIGN KEY (detector_id) REFERENCES detectors(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categorizations (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            confidence REAL NOT NULL,
            detector_version TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(term_id, category_id, confidence, detector_version),
            FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS confirmations (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL,
            user TEXT NOT NULL,
            category_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(term_id, user),
            FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_events (
            id TEXT PRIMARY KEY,
            term_id TEXT NOT NULL,
            source TEXT NOT NULL,
            occurred_at INTEGER NOT NULL,
            FOREIGN KEY (term_id) REFERENCES terms(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Journal names are stored lowercase; duplicates are tolerated.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS journals (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS suggested_resources (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            fingerprint TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS suggested_resource_patterns (
            id TEXT PRIMARY KEY,
            pattern TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            shortcode TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One rollup row per calendar period; a re-run replaces the row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monthly_matches (
            id TEXT PRIMARY KEY,
            period TEXT NOT NULL UNIQUE,
            doi INTEGER NOT NULL,
            isbn INTEGER NOT NULL,
            issn INTEGER NOT NULL,
            pmid INTEGER NOT NULL,
            unmatched INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_detections_term_id ON detections(term_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_categorizations_term_id ON categorizations(term_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_search_events_occurred_at ON search_events(occurred_at)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_journals_name ON journals(name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Fixed taxonomy categories.
const CATEGORIES: &[(&str, &str)] = &[
    (
        "Informational",
        "The user wants to learn about a topic (subject searches, headings).",
    ),
    (
        "Navigational",
        "The user wants to reach a specific page or resource.",
    ),
    (
        "Transactional",
        "The user wants to obtain a known item (identifiers, citations).",
    ),
    ("Undefined", "No signal strong enough to categorize."),
    ("Flagged", "Set aside for manual review."),
];

/// Fixed detector catalog. Detection runs reference these rows by name;
/// they are never created dynamically.
const DETECTORS: &[&str] = &[
    "DOI",
    "ISBN",
    "ISSN",
    "PMID",
    "Journal",
    "LCSH",
    "Citation",
    "SuggestedResource",
    "SuggestedResourcePattern",
    "MLCitation",
];

/// Default detector -> category confidence weights. Admin-managed after
/// seeding; a detector absent here simply contributes no categories.
const WEIGHTS: &[(&str, &str, f64)] = &[
    ("DOI", "Transactional", 0.95),
    ("ISBN", "Transactional", 0.95),
    ("ISSN", "Transactional", 0.95),
    ("PMID", "Transactional", 0.95),
    ("Journal", "Transactional", 0.25),
    ("Journal", "Informational", 0.25),
    ("LCSH", "Informational", 0.7),
    ("Citation", "Transactional", 0.25),
    ("MLCitation", "Transactional", 0.25),
    ("SuggestedResource", "Navigational", 0.95),
    ("SuggestedResourcePattern", "Navigational", 0.95),
];

pub async fn seed_catalog(pool: &SqlitePool) -> Result<()> {
    for (name, description) in CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (id, name, description) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }

    for name in DETECTORS {
        sqlx::query("INSERT OR IGNORE INTO detectors (id, name) VALUES (?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .execute(pool)
            .await?;
    }

    for (detector, category, confidence) in WEIGHTS {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO detector_categories (id, detector_id, category_id, confidence)
            SELECT ?, d.id, c.id, ?
            FROM detectors d, categories c
            WHERE d.name = ? AND c.name = ?
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(confidence)
        .bind(detector)
        .bind(category)
        .execute(pool)
        .await?;
    }

    Ok(())
}
