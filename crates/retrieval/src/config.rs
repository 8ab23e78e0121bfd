//! Retrieval configuration management.
//!
//! Loaded from `.medbill/retrieval.yaml`; every field has a default so a
//! missing or partial file is fine.

use crate::embeddings::EmbeddingConfig;
use crate::types::PolicyKind;
use medbill_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Billing-code CSV, relative to the workspace unless absolute
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub narrative: NarrativeConfig,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/codes.csv")
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            narrative: NarrativeConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Absolute path of the catalog for a workspace.
    pub fn resolve_catalog_path(&self, workspace: &Path) -> PathBuf {
        if self.catalog_path.is_absolute() {
            self.catalog_path.clone()
        } else {
            workspace.join(&self.catalog_path)
        }
    }
}

/// Ranking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Categorization policy used by `search`
    #[serde(default)]
    pub policy: PolicyKind,

    /// Candidates requested from the index; `None` scans the whole catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::CanadianHierarchy,
            top_k: None,
            thresholds: ThresholdConfig::default(),
        }
    }
}

/// Score cutoffs used by the engine and the categorization policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum score for expanded queries of at most 2 words
    pub short_query: f32,

    /// Minimum score for expanded queries of 3 or 4 words
    pub medium_query: f32,

    /// Minimum score for expanded queries of 5 words or more
    pub long_query: f32,

    /// Canadian hierarchy: how many prefix-group codes become primary
    pub primary_cap: usize,

    /// Canadian hierarchy: primary cutoff when no G or H codes are present
    pub fallback_cutoff: f32,

    /// Threshold-based policy: primary cutoff
    pub primary_cutoff: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            short_query: 0.10,
            medium_query: 0.15,
            long_query: 0.20,
            primary_cap: 2,
            fallback_cutoff: 0.3,
            primary_cutoff: 0.6,
        }
    }
}

impl ThresholdConfig {
    /// Relevance threshold for an expanded query of `word_count` words.
    ///
    /// Short queries embed noisily, so they get the loosest threshold.
    pub fn for_word_count(&self, word_count: usize) -> f32 {
        match word_count {
            0..=2 => self.short_query,
            3..=4 => self.medium_query,
            _ => self.long_query,
        }
    }
}

/// Optional language-model narrative settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub enabled: bool,

    /// Upper bound on one narrative call, including retries
    pub timeout_secs: u64,

    pub max_tokens: u32,
    pub temperature: f32,

    /// Codes per group (primary, add-on) included in the prompt context
    pub max_codes_per_group: usize,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 30,
            max_tokens: 1000,
            temperature: 0.3,
            max_codes_per_group: 5,
        }
    }
}

/// Path of the retrieval config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".medbill").join("retrieval.yaml")
}

/// Load retrieval configuration, falling back to defaults when absent.
pub fn load_config(workspace: &Path) -> AppResult<RetrievalConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No retrieval config at {:?}, using defaults", config_path);
        return Ok(RetrievalConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RetrievalConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Loaded retrieval config from {:?}", config_path);
    Ok(config)
}

/// Save retrieval configuration.
pub fn save_config(workspace: &Path, config: &RetrievalConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved retrieval config to {:?}", config_path);
    Ok(())
}
