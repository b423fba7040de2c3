use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub ml: MlConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// Current detector version tag. Detections and categorizations are
    /// scoped to this value; bumping it starts a fresh epoch without
    /// touching historical rows.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_citation_threshold")]
    pub citation_threshold: u32,
}

fn default_version() -> String {
    "unset".to_string()
}
fn default_citation_threshold() -> u32 {
    6
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            citation_threshold: default_citation_threshold(),
        }
    }
}

/// Connection settings for the remote ML citation classifier.
///
/// The oracle is only consulted when `url`, `path`, and `secret` are all
/// present; otherwise citation classification falls back to the heuristic
/// scorer alone.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MlConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_ml_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ml_timeout_secs() -> u64 {
    10
}

impl MlConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.is_some() && self.path.is_some() && self.secret.is_some()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.detector.version.trim().is_empty() {
        anyhow::bail!("detector.version must not be blank");
    }

    if config.detector.citation_threshold == 0 {
        anyhow::bail!("detector.citation_threshold must be >= 1");
    }

    if config.ml.timeout_secs == 0 {
        anyhow::bail!("ml.timeout_secs must be >= 1");
    }

    Ok(config)
}
