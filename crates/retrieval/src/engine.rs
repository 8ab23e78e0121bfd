//! Retrieval and ranking engine.
//!
//! A search expands the query, embeds `query + " " + expanded`, scans the
//! index, drops candidates under the dynamic threshold, deduplicates by code,
//! attaches time-of-day variants and explanations, categorizes, and totals
//! revenue.

use crate::advisor::RevenueContext;
use crate::config::{RetrievalConfig, SearchConfig};
use crate::embeddings::create_provider;
use crate::expander::QueryExpander;
use crate::explain::explain;
use crate::narrative::NarrativeGenerator;
use crate::policy::CategorizationPolicy;
use crate::revenue;
use crate::store::{CatalogStore, IndexSnapshot};
use crate::types::{CatalogEntry, ScoredCandidate, SearchResult, TimePeriod, TimeVariation};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use medbill_core::AppResult;
use medbill_llm::ChatMessage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Answers billing-code queries against a shared [`CatalogStore`].
#[derive(Debug)]
pub struct RetrievalEngine {
    store: Arc<CatalogStore>,
    expander: QueryExpander,
    search: SearchConfig,
}

impl RetrievalEngine {
    pub fn new(store: Arc<CatalogStore>, search: SearchConfig) -> Self {
        Self {
            store,
            expander: QueryExpander::new(),
            search,
        }
    }

    /// Create the configured embedding provider and index `entries`.
    pub async fn from_config(
        config: &RetrievalConfig,
        entries: Vec<CatalogEntry>,
    ) -> AppResult<Self> {
        let provider = create_provider(&config.embedding).await?;
        let store = CatalogStore::build(entries, provider, config.embedding.batch_size).await?;
        Ok(Self::new(Arc::new(store), config.search.clone()))
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// The policy `search` uses.
    pub fn default_policy(&self) -> CategorizationPolicy {
        CategorizationPolicy::from_config(self.search.policy, &self.search.thresholds)
    }

    /// Search with the configured policy and candidate limit.
    pub async fn search(&self, query: &str) -> AppResult<SearchResult> {
        self.run(query, self.search.top_k, &self.default_policy()).await
    }

    /// Search requesting at most `top_k` candidates from the index.
    pub async fn search_top_k(&self, query: &str, top_k: usize) -> AppResult<SearchResult> {
        self.run(query, Some(top_k), &self.default_policy()).await
    }

    /// Search with an explicit categorization policy.
    pub async fn search_with_policy(
        &self,
        query: &str,
        policy: &CategorizationPolicy,
    ) -> AppResult<SearchResult> {
        self.run(query, self.search.top_k, policy).await
    }

    /// Search using a query synthesized from an encounter context.
    pub async fn search_with_context(&self, context: &RevenueContext) -> AppResult<SearchResult> {
        self.search(&context.composite_query()).await
    }

    /// Search, then attach a narrative if the generator produces one.
    ///
    /// Narrative problems never fail the search.
    pub async fn search_with_narrative(
        &self,
        query: &str,
        narrator: &NarrativeGenerator,
        history: &[ChatMessage],
    ) -> AppResult<SearchResult> {
        let mut result = self.search(query).await?;
        result.narrative = narrator.generate(&result, history).await;
        Ok(result)
    }

    async fn run(
        &self,
        query: &str,
        top_k: Option<usize>,
        policy: &CategorizationPolicy,
    ) -> AppResult<SearchResult> {
        let start = Instant::now();
        let expanded = self.expander.expand(query);
        let snapshot = self.store.snapshot();

        if query.trim().is_empty() {
            tracing::debug!("Empty query, returning empty result");
            return Ok(SearchResult::empty(query, expanded, policy.kind()));
        }

        if snapshot.is_empty() {
            tracing::warn!("Search against empty catalog: '{}'", query);
            return Ok(SearchResult::empty(query, expanded, policy.kind()));
        }

        let combined = format!("{} {}", query.trim(), expanded);
        let query_vector = self.store.provider().embed(&combined).await?;
        let hits = snapshot.index().search(&query_vector, top_k)?;

        let threshold = self
            .search
            .thresholds
            .for_word_count(expanded.split_whitespace().count());
        tracing::debug!(
            "Expanded '{}' -> '{}' ({} hits, threshold {:.2})",
            query,
            expanded,
            hits.len(),
            threshold
        );

        let candidates = collect_candidates(&snapshot, &hits, threshold, query);
        let categorized = policy.categorize(candidates);
        let revenue = revenue::breakdown(&categorized.primary, &categorized.add_on);

        tracing::info!(
            "Search '{}' -> {} primary, {} add-on ({}) in {}ms",
            query,
            categorized.primary.len(),
            categorized.add_on.len(),
            categorized.encounter_type,
            start.elapsed().as_millis()
        );

        Ok(SearchResult {
            query: query.to_string(),
            expanded_query: expanded,
            encounter_type: categorized.encounter_type,
            policy: policy.kind(),
            total_primary: categorized.primary.len(),
            total_add_ons: categorized.add_on.len(),
            primary_codes: categorized.primary,
            add_on_codes: categorized.add_on,
            revenue,
            narrative: None,
            generated_at: Utc::now(),
        })
    }
}

/// Turn score-ordered index hits into deduplicated, explained candidates.
fn collect_candidates(
    snapshot: &IndexSnapshot,
    hits: &[(usize, f32)],
    threshold: f32,
    query: &str,
) -> Vec<ScoredCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for &(row, score) in hits {
        if score < threshold {
            continue;
        }
        let Some(entry) = snapshot.entry(row) else {
            continue;
        };
        if !seen.insert(entry.code.as_str()) {
            continue;
        }

        let variants = snapshot.rows_for_code(&entry.code);
        let mut candidate = ScoredCandidate::from_entry(entry, score);
        candidate.numeric_amount = variants
            .iter()
            .map(|v| v.numeric_amount)
            .fold(entry.numeric_amount, f64::max);
        candidate.is_variable_pricing = variants.iter().any(|v| v.is_variable_pricing);
        candidate.has_time_variations = variants.len() > 1;
        candidate.time_variations = variants
            .iter()
            .map(|v| TimeVariation {
                period: TimePeriod::detect(&v.description),
                description: v.description.clone(),
                amount: v.raw_amount.clone(),
                numeric_amount: v.numeric_amount,
            })
            .collect();
        candidate.relevance_explanation = explain(query, &candidate);

        candidates.push(candidate);
    }

    candidates
}
