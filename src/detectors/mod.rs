//! Pattern detectors.
//!
//! Each detector examines a phrase independently and, when it finds
//! something, records evidence through the detection ledger. The set of
//! detectors is closed at compile time ([`DetectorKind`]); the seeded
//! catalog rows in the `detectors` table carry the category weights used
//! by the aggregator.
//!
//! Detection (`detect` in each submodule) is side-effect free; recording
//! (`record`) is idempotent find-or-create keyed on
//! (term, detector, version). `record` fires only when findings are
//! non-empty, so re-running a phrase never grows the ledger.

pub mod citation;
pub mod identifiers;
pub mod journal;
pub mod lcsh;
pub mod ml_citation;
pub mod suggested_resource;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::warn;

use crate::config::Config;
use crate::ledger::{record_detection, RunContext};
use crate::models::Term;

/// The closed set of detection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    StandardIdentifiers,
    Journal,
    Lcsh,
    Citation,
    SuggestedResource,
    SuggestedResourcePattern,
    MlCitation,
}

impl DetectorKind {
    /// Run order. The ML oracle goes last so the only blocking network
    /// call never delays the local detectors.
    pub const ALL: [DetectorKind; 7] = [
        DetectorKind::StandardIdentifiers,
        DetectorKind::Journal,
        DetectorKind::Lcsh,
        DetectorKind::Citation,
        DetectorKind::SuggestedResource,
        DetectorKind::SuggestedResourcePattern,
        DetectorKind::MlCitation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::StandardIdentifiers => "StandardIdentifiers",
            DetectorKind::Journal => "Journal",
            DetectorKind::Lcsh => "LCSH",
            DetectorKind::Citation => "Citation",
            DetectorKind::SuggestedResource => "SuggestedResource",
            DetectorKind::SuggestedResourcePattern => "SuggestedResourcePattern",
            DetectorKind::MlCitation => "MLCitation",
        }
    }
}

/// Run one detector against a term and record any findings.
///
/// StandardIdentifiers fans out to one catalog row per identifier kind
/// that matched (DOI, ISBN, ISSN, PMID); every other detector maps to a
/// single catalog row and records at most one detection no matter how
/// many individual findings it produced.
pub async fn record(
    kind: DetectorKind,
    pool: &SqlitePool,
    config: &Config,
    ctx: &RunContext,
    term: &Term,
) -> Result<()> {
    match kind {
        DetectorKind::StandardIdentifiers => {
            let findings = identifiers::detect(&term.phrase);
            for name in findings.matched_detectors() {
                record_detection(pool, ctx, &term.id, name).await?;
            }
        }
        DetectorKind::Journal => {
            if !journal::detect(pool, &term.phrase).await?.is_empty() {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
        DetectorKind::Lcsh => {
            if lcsh::detect(&term.phrase).is_some() {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
        DetectorKind::Citation => {
            if citation::detect(&term.phrase, config.detector.citation_threshold) {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
        DetectorKind::SuggestedResource => {
            if suggested_resource::detect(pool, &term.phrase).await?.is_some() {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
        DetectorKind::SuggestedResourcePattern => {
            if !suggested_resource::detect_patterns(pool, &term.phrase)
                .await?
                .is_empty()
            {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
        DetectorKind::MlCitation => {
            if !config.ml.is_enabled() {
                return Ok(());
            }
            let features = citation::features(&term.phrase);
            if ml_citation::detect(&config.ml, &features).await {
                record_detection(pool, ctx, &term.id, kind.name()).await?;
            }
        }
    }

    Ok(())
}

/// Run every detector's `record` against a term, best effort.
///
/// A failing detector never prevents the others from running; its error
/// is logged and returned alongside the rest once all detectors have
/// completed, so the caller can surface partial-evidence runs.
pub async fn record_all(
    pool: &SqlitePool,
    config: &Config,
    ctx: &RunContext,
    term: &Term,
) -> Vec<(DetectorKind, anyhow::Error)> {
    let mut failures = Vec::new();

    for kind in DetectorKind::ALL {
        if let Err(error) = record(kind, pool, config, ctx, term).await {
            warn!(detector = kind.name(), %error, "detector failed; continuing with the rest");
            failures.push((kind, error));
        }
    }

    failures
}
