// src/config.rs
//! Runtime configuration: TOML file plus a couple of env overrides.
//!
//! TOML shape:
//! ```toml
//! [ranking]
//! confidence = 0.95
//! top_k = 20
//! malformed = "reject"      # or "clamp"
//!
//! [rating]
//! weights = [28, 26, 24, 22]
//! empty_bucket = "reject"   # or "renormalize"
//! ```
//!
//! Lookup order for the file:
//! 1) $REVIEW_RANK_CONFIG_PATH (must exist)
//! 2) config/review_rank.toml (built-in defaults if missing)

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::ranking::{ScoreKind, DEFAULT_TOP_K};
use crate::rating::{EmptyBucketPolicy, QuartileWeights};
use crate::review::MalformedPolicy;
use crate::scoring::Confidence;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/review_rank.toml";

pub const ENV_CONFIG_PATH: &str = "REVIEW_RANK_CONFIG_PATH";
pub const ENV_CONFIDENCE: &str = "REVIEW_RANK_CONFIDENCE";
pub const ENV_TOP_K: &str = "REVIEW_RANK_TOP_K";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ranking: RankingSection,
    pub rating: RatingSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    pub confidence: Confidence,
    pub top_k: usize,
    pub by: ScoreKind,
    pub malformed: MalformedPolicy,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            confidence: Confidence::default(),
            top_k: DEFAULT_TOP_K,
            by: ScoreKind::default(),
            malformed: MalformedPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatingSection {
    pub weights: QuartileWeights,
    pub empty_bucket: EmptyBucketPolicy,
}

impl AppConfig {
    /// Resolve the config file, parse it, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::from_path(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Self::from_path(&pb)?
                } else {
                    info!(target: "config", "no config file found; using built-in defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&content)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        info!(target: "config", path = %path.display(), "config loaded");
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Env wins over the file; unparsable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Some(c) = parse_confidence_env(std::env::var(ENV_CONFIDENCE).ok()) {
            self.ranking.confidence = c;
        }
        if let Some(k) = parse_top_k_env(std::env::var(ENV_TOP_K).ok()) {
            self.ranking.top_k = k;
        }
    }
}

fn parse_confidence_env(raw: Option<String>) -> Option<Confidence> {
    let raw = raw?;
    match raw.trim().parse::<f64>().map_err(|e| e.to_string()).and_then(|v| {
        Confidence::new(v).map_err(|e| e.to_string())
    }) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!(target: "config", value = %raw, error = %e, "ignoring {ENV_CONFIDENCE}");
            None
        }
    }
}

fn parse_top_k_env(raw: Option<String>) -> Option<usize> {
    let raw = raw?;
    match raw.trim().parse::<usize>() {
        Ok(k) => Some(k),
        Err(e) => {
            warn!(target: "config", value = %raw, error = %e, "ignoring {ENV_TOP_K}");
            None
        }
    }
}
