//! Core data models for the classification pipeline.
//!
//! These types mirror the persisted schema: terms flow in from search-event
//! logging, detectors attach evidence (detections), and the aggregator
//! derives categorization scores from that evidence.

/// A de-duplicated search string, the atomic unit of work.
#[derive(Debug, Clone)]
pub struct Term {
    pub id: String,
    pub phrase: String,
    pub fingerprint_id: Option<String>,
    pub flagged: bool,
    pub created_at: i64,
}

/// Catalog row for a named detection algorithm (e.g. "DOI", "Citation").
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Detector {
    pub id: String,
    pub name: String,
}

/// One of the fixed taxonomy categories.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Weight edge: if a detector fires, it contributes `confidence` toward
/// the linked category.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct DetectorCategoryWeight {
    pub detector_id: String,
    pub category_id: String,
    pub confidence: f64,
}

/// Evidence record: one detector fired on one term under one algorithm
/// version. Never mutated; removed only when the owning term is deleted.
#[derive(Debug, Clone)]
pub struct Detection {
    pub id: String,
    pub term_id: String,
    pub detector_id: String,
    pub detector_version: String,
    pub created_at: i64,
}

/// Derived confidence score linking a term to a category.
#[derive(Debug, Clone)]
pub struct Categorization {
    pub id: String,
    pub term_id: String,
    pub category_id: String,
    pub confidence: f64,
    pub detector_version: String,
    pub created_at: i64,
}

/// Human-submitted ground truth for a term, independent of the automated
/// categorization. At most one per (term, user).
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub id: String,
    pub term_id: String,
    pub user: String,
    pub category_id: String,
    pub created_at: i64,
}

/// A logged observation of a term from a contributing system.
#[derive(Debug, Clone)]
pub struct SearchEvent {
    pub id: String,
    pub term_id: String,
    pub source: String,
    pub occurred_at: i64,
}

/// Journal registry entry. Names are stored lowercase; duplicate names
/// are tolerated.
#[derive(Debug, Clone)]
pub struct Journal {
    pub id: String,
    pub name: String,
}

/// Curated resource matched by exact fingerprint.
#[derive(Debug, Clone)]
pub struct SuggestedResource {
    pub id: String,
    pub title: String,
    pub url: String,
    pub fingerprint: String,
}

/// Admin-curated regex rule pointing at a resource.
#[derive(Debug, Clone)]
pub struct SuggestedResourcePattern {
    pub id: String,
    pub pattern: String,
    pub title: String,
    pub url: String,
    pub shortcode: String,
}

/// Identifier-match tallies for one rollup period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub doi: i64,
    pub isbn: i64,
    pub issn: i64,
    pub pmid: i64,
    pub unmatched: i64,
}
