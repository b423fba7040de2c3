//! End-to-end tests for the detection and categorization engine, run
//! against a temporary SQLite database through the library API.

use sqlx::SqlitePool;
use tempfile::TempDir;

use tacos::categorize::calculate_categorizations;
use tacos::config::{Config, DbConfig, DetectorConfig, MlConfig};
use tacos::confirm::{confirm, ConfirmError};
use tacos::db;
use tacos::detectors::{suggested_resource, DetectorKind};
use tacos::fingerprint::resource_fingerprint;
use tacos::ingest::{find_or_create_term, log_event};
use tacos::ledger::{current_detections, detection_count, RunContext};
use tacos::migrate;
use tacos::models::Term;
use tacos::rollup::run_rollup;

async fn setup() -> (TempDir, SqlitePool, Config) {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        db: DbConfig {
            path: tmp.path().join("tacos.sqlite"),
        },
        detector: DetectorConfig::default(),
        ml: MlConfig::default(),
    };

    let pool = db::connect(&config).await.unwrap();
    migrate::create_schema(&pool).await.unwrap();
    migrate::seed_catalog(&pool).await.unwrap();

    (tmp, pool, config)
}

async fn term(pool: &SqlitePool, phrase: &str) -> Term {
    find_or_create_term(pool, phrase).await.unwrap()
}

/// Current categorizations as (category name, confidence) pairs.
async fn categorized(pool: &SqlitePool, ctx: &RunContext, term_id: &str) -> Vec<(String, f64)> {
    tacos::categorize::current_categorizations(pool, ctx, term_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_doi_end_to_end() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    let term = term(&pool, "10.1038/nphys1170").await;
    let outcome = calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();
    assert!(outcome.failures.is_empty());

    // Exactly one detection, attributed to the DOI catalog row.
    let detector_names: Vec<String> = sqlx::query_scalar(
        "SELECT dt.name FROM detections d JOIN detectors dt ON dt.id = d.detector_id WHERE d.term_id = ?",
    )
    .bind(&term.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(detector_names, vec!["DOI"]);

    let scores = categorized(&pool, &ctx, &term.id).await;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].0, "Transactional");
    assert!((scores[0].1 - 0.95).abs() < 1e-9);
}

#[tokio::test]
async fn test_recording_is_idempotent() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    let term = term(&pool, "10.1038/nphys1170").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();
    let after_first = detection_count(&pool, &term.id).await.unwrap();

    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();
    let after_second = detection_count(&pool, &term.id).await.unwrap();

    assert_eq!(after_first, after_second);

    let categorization_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categorizations WHERE term_id = ?")
            .bind(&term.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(categorization_count, 1);
}

#[tokio::test]
async fn test_version_bump_grows_detections() {
    let (_tmp, pool, config) = setup().await;

    let term = term(&pool, "pmid: 32511222").await;

    let v1 = RunContext::new("v1");
    calculate_categorizations(&pool, &config, &v1, &term)
        .await
        .unwrap();
    let after_v1 = detection_count(&pool, &term.id).await.unwrap();
    assert_eq!(after_v1, 1);

    let v2 = RunContext::new("v2");
    calculate_categorizations(&pool, &config, &v2, &term)
        .await
        .unwrap();
    let after_v2 = detection_count(&pool, &term.id).await.unwrap();
    assert_eq!(after_v2, 2);

    // Each epoch sees only its own detections and categorizations.
    assert_eq!(current_detections(&pool, &v1, &term.id).await.unwrap().len(), 1);
    assert_eq!(current_detections(&pool, &v2, &term.id).await.unwrap().len(), 1);
    assert_eq!(categorized(&pool, &v1, &term.id).await.len(), 1);
    assert_eq!(categorized(&pool, &v2, &term.id).await.len(), 1);
}

#[tokio::test]
async fn test_confidences_average_per_category() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    // ISSN contributes 0.91 so the DOI+ISSN mean exercises rounding.
    sqlx::query(
        "UPDATE detector_categories SET confidence = 0.91 WHERE detector_id = (SELECT id FROM detectors WHERE name = 'ISSN')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let term = term(&pool, "10.1000/182 and 1460-244X").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    let scores = categorized(&pool, &ctx, &term.id).await;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].0, "Transactional");
    assert!((scores[0].1 - 0.93).abs() < 1e-9);
}

#[tokio::test]
async fn test_duplicate_categorization_row_rejected_by_index() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    let term = term(&pool, "10.1038/nphys1170").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    // A raw duplicate insert (identical term, category, confidence,
    // version) must hit the unique constraint.
    let result = sqlx::query(
        r#"
        INSERT INTO categorizations (id, term_id, category_id, confidence, detector_version, created_at)
        SELECT 'dup-id', term_id, category_id, confidence, detector_version, created_at
        FROM categorizations WHERE term_id = ?
        "#,
    )
    .bind(&term.id)
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_confirmation_unique_per_term_and_user() {
    let (_tmp, pool, _config) = setup().await;

    let term = term(&pool, "climate change adaptation").await;

    confirm(&pool, &term, "aardvark", "Informational")
        .await
        .unwrap();

    let duplicate = confirm(&pool, &term, "aardvark", "Transactional").await;
    assert!(matches!(duplicate, Err(ConfirmError::Duplicate { .. })));

    // A different user can still confirm the same term.
    confirm(&pool, &term, "buzzard", "Transactional")
        .await
        .unwrap();

    let unknown = confirm(&pool, &term, "cheetah", "NotACategory").await;
    assert!(matches!(unknown, Err(ConfirmError::UnknownCategory(_))));
}

#[tokio::test]
async fn test_suggested_resource_exact_fingerprint_match() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    sqlx::query(
        "INSERT INTO suggested_resources (id, title, url, fingerprint) VALUES ('sr1', 'Web of Science', 'https://webofscience.example.com', ?)",
    )
    .bind(resource_fingerprint("Web of Science"))
    .execute(&pool)
    .await
    .unwrap();

    // Word order, case, and punctuation differences still match.
    let hit = suggested_resource::detect(&pool, "science OF web!")
        .await
        .unwrap();
    assert_eq!(hit.unwrap().title, "Web of Science");

    let miss = suggested_resource::detect(&pool, "science citation index")
        .await
        .unwrap();
    assert!(miss.is_none());

    let term = term(&pool, "Web of Science").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();
    let scores = categorized(&pool, &ctx, &term.id).await;
    assert_eq!(scores, vec![("Navigational".to_string(), 0.95)]);
}

#[tokio::test]
async fn test_pattern_rules_report_all_but_record_once() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    sqlx::query(
        "INSERT INTO suggested_resource_patterns (id, pattern, title, url, shortcode) VALUES
         ('p1', '(?i)jstor', 'JSTOR', 'https://jstor.example.com', 'jstor'),
         ('p2', '(?i)\\bstor\\b|jstor', 'Storage Guide', 'https://guides.example.com/stor', 'stor')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let matches = suggested_resource::detect_patterns(&pool, "JSTOR access")
        .await
        .unwrap();
    assert_eq!(matches.len(), 2);

    let term = term(&pool, "JSTOR access").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    // Two matching rules still produce a single detection.
    assert_eq!(detection_count(&pool, &term.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_journal_exact_match_detected() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    sqlx::query("INSERT INTO journals (id, name) VALUES ('j1', 'nature physics')")
        .execute(&pool)
        .await
        .unwrap();

    let term = term(&pool, "Nature Physics").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    let detector_names: Vec<String> = sqlx::query_scalar(
        "SELECT dt.name FROM detections d JOIN detectors dt ON dt.id = d.detector_id WHERE d.term_id = ?",
    )
    .bind(&term.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(detector_names, vec!["Journal"]);

    // Journal carries two weight edges, so two categories come back.
    let scores = categorized(&pool, &ctx, &term.id).await;
    assert_eq!(scores.len(), 2);
}

#[tokio::test]
async fn test_detector_without_weights_contributes_nothing() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    sqlx::query(
        "DELETE FROM detector_categories WHERE detector_id = (SELECT id FROM detectors WHERE name = 'LCSH')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let term = term(&pool, "united states -- history").await;
    calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    // The detection is still recorded; it just maps to no category.
    assert_eq!(detection_count(&pool, &term.id).await.unwrap(), 1);
    assert!(categorized(&pool, &ctx, &term.id).await.is_empty());
}

#[tokio::test]
async fn test_failing_detector_does_not_block_the_rest() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    // Break one detector's registry out from under it.
    sqlx::query("DROP TABLE suggested_resource_patterns")
        .execute(&pool)
        .await
        .unwrap();

    let term = term(&pool, "10.1038/nphys1170").await;
    let outcome = calculate_categorizations(&pool, &config, &ctx, &term)
        .await
        .unwrap();

    // The broken detector is reported by name after the run completes...
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, DetectorKind::SuggestedResourcePattern);

    // ...and the others still ran: the DOI evidence and its
    // categorization are intact.
    let detector_names: Vec<String> = sqlx::query_scalar(
        "SELECT dt.name FROM detections d JOIN detectors dt ON dt.id = d.detector_id WHERE d.term_id = ?",
    )
    .bind(&term.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(detector_names, vec!["DOI"]);

    let scores = categorized(&pool, &ctx, &term.id).await;
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].0, "Transactional");
}

#[tokio::test]
async fn test_blank_phrase_rejected_at_every_entry_point() {
    let (_tmp, pool, _config) = setup().await;

    // The shared find-or-create path guards the categorize and confirm
    // entry points as well as log_event.
    assert!(find_or_create_term(&pool, "").await.is_err());
    assert!(find_or_create_term(&pool, "   ").await.is_err());
    assert!(find_or_create_term(&pool, " \t ").await.is_err());

    let terms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terms")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(terms, 0);
}

#[tokio::test]
async fn test_log_event_rejects_blank_phrase() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    assert!(log_event(&pool, &config, &ctx, "   ", "cli").await.is_err());

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(events, 0);
}

#[tokio::test]
async fn test_log_event_deduplicates_terms_and_shares_fingerprints() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    let (event1, _) = log_event(&pool, &config, &ctx, "Moungi Bawendi", "timdex")
        .await
        .unwrap();
    let (event2, _) = log_event(&pool, &config, &ctx, "Moungi Bawendi", "website")
        .await
        .unwrap();
    let (event3, _) = log_event(&pool, &config, &ctx, "Bawendi, Moungi", "website")
        .await
        .unwrap();

    // Same phrase, one term; different phrase, different term.
    assert_eq!(event1.term_id, event2.term_id);
    assert_ne!(event1.term_id, event3.term_id);

    // Word order and punctuation changes share a fingerprint.
    let fingerprint_ids: Vec<Option<String>> =
        sqlx::query_scalar("SELECT fingerprint_id FROM terms ORDER BY created_at")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(fingerprint_ids.len(), 2);
    assert_eq!(fingerprint_ids[0], fingerprint_ids[1]);
    assert!(fingerprint_ids[0].is_some());

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(events, 3);
}

#[tokio::test]
async fn test_rollup_tallies_current_month_and_reruns_in_place() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    log_event(&pool, &config, &ctx, "10.1038/nphys1170", "cli")
        .await
        .unwrap();
    log_event(&pool, &config, &ctx, "1460-244X", "cli")
        .await
        .unwrap();
    log_event(&pool, &config, &ctx, "a plain old search", "cli")
        .await
        .unwrap();

    let (period, counts) = run_rollup(&pool, None).await.unwrap();
    assert_eq!(counts.doi, 1);
    assert_eq!(counts.issn, 1);
    assert_eq!(counts.isbn, 0);
    assert_eq!(counts.pmid, 0);
    assert_eq!(counts.unmatched, 1);

    // Re-running the same period replaces the row instead of appending.
    let (_, counts_again) = run_rollup(&pool, Some(period.clone())).await.unwrap();
    assert_eq!(counts, counts_again);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monthly_matches WHERE period = ?")
        .bind(&period)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_rollup_period_spellings_share_one_row() {
    let (_tmp, pool, _config) = setup().await;

    // Unpadded and padded month spellings land on the same period key.
    let (period1, _) = run_rollup(&pool, Some("2025-1".to_string())).await.unwrap();
    let (period2, _) = run_rollup(&pool, Some("2025-01".to_string())).await.unwrap();
    assert_eq!(period1, "2025-01");
    assert_eq!(period1, period2);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monthly_matches")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_term_delete_cascades_but_keeps_fingerprint() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    let (event, _) = log_event(&pool, &config, &ctx, "10.1038/nphys1170", "cli")
        .await
        .unwrap();
    let term_id = event.term_id;

    confirm(
        &pool,
        &find_or_create_term(&pool, "10.1038/nphys1170").await.unwrap(),
        "aardvark",
        "Transactional",
    )
    .await
    .unwrap();

    sqlx::query("DELETE FROM terms WHERE id = ?")
        .bind(&term_id)
        .execute(&pool)
        .await
        .unwrap();

    for table in ["detections", "categorizations", "confirmations", "search_events"] {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE term_id = ?", table))
                .bind(&term_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 0, "{} rows survived the cascade", table);
    }

    // Fingerprints are shared and survive term deletion.
    let fingerprints: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fingerprints")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(fingerprints, 1);
}

#[tokio::test]
async fn test_fingerprint_delete_nullifies_terms() {
    let (_tmp, pool, config) = setup().await;
    let ctx = RunContext::new("v1");

    log_event(&pool, &config, &ctx, "some search phrase", "cli")
        .await
        .unwrap();

    sqlx::query("DELETE FROM fingerprints")
        .execute(&pool)
        .await
        .unwrap();

    let fingerprint_id: Option<String> =
        sqlx::query_scalar("SELECT fingerprint_id FROM terms WHERE phrase = 'some search phrase'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(fingerprint_id.is_none());
}
