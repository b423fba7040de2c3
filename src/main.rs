//! # TACOS CLI (`tacos`)
//!
//! Command-line interface over the classification engine: database setup,
//! search-event logging, categorization, manual detector inspection,
//! human confirmations, and the monthly metrics rollup.
//!
//! ## Usage
//!
//! ```bash
//! tacos --config ./config/tacos.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tacos init` | Create the SQLite database, run migrations, seed the catalog |
//! | `tacos log-event "<phrase>"` | Log a search event and categorize its term |
//! | `tacos categorize "<phrase>"` | Run detection + categorization without logging an event |
//! | `tacos detect "<phrase>"` | Print detector findings without recording anything |
//! | `tacos confirm "<phrase>"` | Record a human categorization |
//! | `tacos rollup` | Tally identifier matches for a calendar month |
//! | `tacos version` | Print the current detector version |

mod categorize;
mod config;
mod confirm;
mod db;
mod detectors;
mod fingerprint;
mod ingest;
mod ledger;
mod migrate;
mod models;
mod rollup;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::detectors::{citation, identifiers, journal, lcsh, suggested_resource};
use crate::ledger::RunContext;

/// TACOS — search-term classification for library discovery systems.
#[derive(Parser)]
#[command(
    name = "tacos",
    about = "TACOS — pattern detection and categorization for search terms",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tacos.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and seed the detector catalog.
    ///
    /// Idempotent — running it multiple times is safe.
    Init,

    /// Log a search event: find-or-create the term, run every detector,
    /// aggregate categorizations, and record the event.
    LogEvent {
        /// The raw search phrase.
        phrase: String,

        /// Contributing system the event came from.
        #[arg(long, default_value = "cli")]
        source: String,
    },

    /// Run detection and categorization for a phrase without logging a
    /// search event.
    Categorize {
        /// The raw search phrase.
        phrase: String,
    },

    /// Print detector findings for a phrase without recording anything.
    Detect {
        /// The raw search phrase.
        phrase: String,

        /// Also scan the whole journal registry for partial name matches
        /// (slow; manual inspection only).
        #[arg(long)]
        partial_journals: bool,
    },

    /// Record a human confirmation of a term's category.
    Confirm {
        /// The search phrase being confirmed.
        phrase: String,

        /// Confirming user.
        #[arg(long)]
        user: String,

        /// Category name (Informational, Navigational, Transactional,
        /// Undefined, Flagged).
        #[arg(long)]
        category: String,
    },

    /// Tally identifier matches over one calendar month of search events.
    Rollup {
        /// Period to roll up (YYYY-MM). Defaults to the current month.
        #[arg(long)]
        month: Option<String>,
    },

    /// Print the current detector version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let ctx = RunContext::new(cfg.detector.version.clone());

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::LogEvent { phrase, source } => {
            let pool = db::connect(&cfg).await?;
            let (event, outcome) = ingest::log_event(&pool, &cfg, &ctx, &phrase, &source).await?;
            println!("logged event {} from {}", event.id, event.source);
            print_outcome(&pool, &ctx, &event.term_id, &outcome).await?;
            pool.close().await;
        }
        Commands::Categorize { phrase } => {
            let pool = db::connect(&cfg).await?;
            let term = ingest::find_or_create_term(&pool, &phrase).await?;
            let outcome = categorize::calculate_categorizations(&pool, &cfg, &ctx, &term).await?;
            print_outcome(&pool, &ctx, &term.id, &outcome).await?;
            pool.close().await;
        }
        Commands::Detect {
            phrase,
            partial_journals,
        } => {
            let pool = db::connect(&cfg).await?;
            run_detect(&pool, &cfg, &phrase, partial_journals).await?;
            pool.close().await;
        }
        Commands::Confirm {
            phrase,
            user,
            category,
        } => {
            let pool = db::connect(&cfg).await?;
            let term = ingest::find_or_create_term(&pool, &phrase).await?;
            match confirm::confirm(&pool, &term, &user, &category).await {
                Ok(confirmation) => {
                    println!("confirmed '{}' as {} by {}", phrase, category, user);
                    println!("  id: {}", confirmation.id);
                }
                Err(confirm::ConfirmError::Duplicate { phrase, user }) => {
                    println!("'{}' was already confirmed by {}; duplicate confirmations are not supported", phrase, user);
                }
                Err(other) => return Err(other.into()),
            }
            pool.close().await;
        }
        Commands::Rollup { month } => {
            let pool = db::connect(&cfg).await?;
            let (period, counts) = rollup::run_rollup(&pool, month).await?;
            println!("rollup {}", period);
            println!("  doi: {}", counts.doi);
            println!("  isbn: {}", counts.isbn);
            println!("  issn: {}", counts.issn);
            println!("  pmid: {}", counts.pmid);
            println!("  unmatched: {}", counts.unmatched);
            pool.close().await;
        }
        Commands::Version => {
            println!("{}", cfg.detector.version);
        }
    }

    Ok(())
}

async fn print_outcome(
    pool: &sqlx::SqlitePool,
    ctx: &RunContext,
    term_id: &str,
    outcome: &categorize::CategorizationOutcome,
) -> anyhow::Result<()> {
    for (kind, error) in &outcome.failures {
        eprintln!("detector {} failed: {}", kind.name(), error);
    }

    let current = categorize::current_categorizations(pool, ctx, term_id).await?;
    if current.is_empty() {
        println!("no categorization (no detector fired)");
        return Ok(());
    }

    for (category, confidence) in current {
        println!("  {}: {:.2}", category, confidence);
    }
    Ok(())
}

/// Manual inspection: run every detector's pure half and print findings.
async fn run_detect(
    pool: &sqlx::SqlitePool,
    cfg: &config::Config,
    phrase: &str,
    partial_journals: bool,
) -> anyhow::Result<()> {
    let findings = identifiers::detect(phrase);
    if let Some(doi) = &findings.doi {
        println!("doi: {}", doi);
    }
    if let Some(isbn) = &findings.isbn {
        println!("isbn: {}", isbn);
    }
    if let Some(issn) = &findings.issn {
        println!("issn: {}", issn);
    }
    if let Some(pmid) = &findings.pmid {
        println!("pmid: {}", pmid);
    }

    if let Some(segments) = lcsh::detect(phrase) {
        println!("lcsh: {}", segments.join(" / "));
    }

    let features = citation::features(phrase);
    let score = citation::score(&features);
    println!(
        "citation score: {} (threshold {})",
        score, cfg.detector.citation_threshold
    );

    for j in journal::detect(pool, phrase).await? {
        println!("journal: {}", j.name);
    }
    if partial_journals {
        for j in journal::detect_partial(pool, phrase).await? {
            println!("journal (partial): {}", j.name);
        }
    }

    if let Some(resource) = suggested_resource::detect(pool, phrase).await? {
        println!("suggested resource: {} ({})", resource.title, resource.url);
    }
    for rule in suggested_resource::detect_patterns(pool, phrase).await? {
        println!("suggested pattern: {} [{}]", rule.title, rule.shortcode);
    }

    println!("fingerprint: {}", fingerprint::fingerprint(phrase));
    Ok(())
}
