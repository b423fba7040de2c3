//! Remote ML citation oracle client.
//!
//! A thin HTTP client over an externally trained citation classifier. The
//! oracle is consulted only when all three connection values (url, path,
//! shared secret) are configured; in every failure mode — missing config,
//! network error, timeout, non-200 status, malformed body — the result
//! degrades to "no detection" with a warning, never an error. Citation
//! classification then rests on the heuristic scorer alone.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::config::MlConfig;
use crate::detectors::citation::CitationFeatures;

/// Ask the remote oracle whether the features describe a citation.
pub async fn detect(config: &MlConfig, features: &CitationFeatures) -> bool {
    let (url, path, secret) = match (&config.url, &config.path, &config.secret) {
        (Some(url), Some(path), Some(secret)) => (url, path, secret),
        _ => return false,
    };

    let endpoint = format!("{}{}", url.trim_end_matches('/'), path);

    let client = match Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(error) => {
            warn!(%error, "could not build ML oracle client");
            return false;
        }
    };

    let body = json!({
        "action": "predict",
        "features": wire_features(features),
        "challenge_secret": secret,
    });

    let response = match client.post(&endpoint).json(&body).send().await {
        Ok(response) => response,
        Err(error) => {
            warn!(%error, "ML citation oracle unreachable; treating as no detection");
            return false;
        }
    };

    if !response.status().is_success() {
        warn!(status = %response.status(), "ML citation oracle returned an error status");
        return false;
    }

    match response.json::<serde_json::Value>().await {
        Ok(json) => json
            .get("response")
            .and_then(|value| value.as_str())
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        Err(error) => {
            warn!(%error, "ML citation oracle returned an unparseable body");
            false
        }
    }
}

/// Feature vector in the oracle's wire format: `apa_volume_issue` is sent
/// as `apa`, `year_parens` as `year`, and `characters` is dropped. This
/// renaming is part of the wire contract with the trained model.
pub fn wire_features(f: &CitationFeatures) -> serde_json::Value {
    json!({
        "apa": f.apa_volume_issue,
        "no": f.no,
        "pages": f.pages,
        "pp": f.pp,
        "vol": f.vol,
        "year": f.year_parens,
        "brackets": f.brackets,
        "lastnames": f.lastnames,
        "quotes": f.quotes,
        "colons": f.colons,
        "commas": f.commas,
        "periods": f.periods,
        "semicolons": f.semicolons,
        "words": f.words,
    })
}
