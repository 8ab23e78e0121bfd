//! Billing-code retrieval and ranking.
//!
//! Loads a billing-code catalog, indexes it with an embedding provider and
//! answers free-text clinical queries with primary and add-on codes, relevance
//! explanations and revenue totals.

pub mod advisor;
pub mod catalog;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod expander;
pub mod explain;
pub mod narrative;
pub mod policy;
pub mod revenue;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use advisor::{
    BillingRecommendation, CodeCombination, Complexity, OptimizationPlan, RevenueAdvisor,
    RevenueContext, RevenuePatterns, TimeOfDay,
};
pub use catalog::{load_catalog, load_catalog_from_reader};
pub use config::{NarrativeConfig, RetrievalConfig, SearchConfig, ThresholdConfig};
pub use engine::RetrievalEngine;
pub use expander::{expand_query, QueryExpander};
pub use narrative::NarrativeGenerator;
pub use policy::CategorizationPolicy;
pub use store::CatalogStore;
pub use types::{
    CatalogEntry, Category, EncounterType, PolicyKind, RevenueBreakdown, ScoredCandidate,
    SearchResult,
};

use medbill_core::AppResult;
use std::path::Path;
use std::time::Instant;

/// Load the configured catalog and build a ready-to-query engine.
///
/// Catalog and embedding failures abort here; nothing is served from a
/// partially built index.
pub async fn open(workspace: &Path, config: &RetrievalConfig) -> AppResult<RetrievalEngine> {
    let start = Instant::now();
    config.embedding.validate()?;

    let catalog_path = config.resolve_catalog_path(workspace);
    tracing::info!("Loading billing catalog from {}", catalog_path.display());
    let entries = load_catalog(&catalog_path)?;

    let engine = RetrievalEngine::from_config(config, entries).await?;
    tracing::info!(
        "Retrieval engine ready ({}, {} policy) in {}ms",
        engine.store().provider().model_name(),
        engine.search_config().policy,
        start.elapsed().as_millis()
    );

    Ok(engine)
}
