//! # TACOS
//!
//! Tool for Analyzing and Categorizing Search terms.
//!
//! Contributing systems submit free-text search queries; TACOS detects
//! structured patterns in them (standard identifiers, journal names,
//! citation-like structure, curated suggested-resource matches) and
//! aggregates those detections into per-category confidence scores.
//! A human validation workflow records staff confirmations alongside the
//! automated results.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐   ┌───────────────┐
//! │  Ingest  │──▶│   Detectors    │──▶│  Ledger   │──▶│  Aggregator    │
//! │ log_event│   │ DOI/ISSN/...  │   │ dedup+ver │   │ weights→score │
//! └──────────┘   └───────────────┘   └─────┬─────┘   └───────┬───────┘
//!                                          │                 │
//!                                          ▼                 ▼
//!                                    ┌──────────┐     ┌───────────────┐
//!                                    │  Rollup  │     │Categorizations│
//!                                    └──────────┘     └───────────────┘
//! ```
//!
//! Detections and categorizations carry a detector version tag; bumping
//! the configured version re-scores phrases into a fresh epoch without
//! destroying history.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fingerprint`] | Canonical phrase normalization |
//! | [`detectors`] | Pattern detectors |
//! | [`ledger`] | Versioned detection recording |
//! | [`categorize`] | Confidence aggregation |
//! | [`ingest`] | Search-event logging |
//! | [`confirm`] | Human validation |
//! | [`rollup`] | Monthly identifier match counts |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations and catalog seeding |

pub mod categorize;
pub mod config;
pub mod confirm;
pub mod db;
pub mod detectors;
pub mod fingerprint;
pub mod ingest;
pub mod ledger;
pub mod migrate;
pub mod models;
pub mod rollup;
