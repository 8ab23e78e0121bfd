//! Shared catalog and index state.
//!
//! Searches read an immutable [`IndexSnapshot`]. A rebuild constructs a
//! complete new snapshot and swaps it in only once it is ready, so readers
//! never see a partially built index.

use crate::embeddings::EmbeddingProvider;
use crate::types::CatalogEntry;
use crate::vector_index::FlatIndex;
use chrono::{DateTime, Utc};
use medbill_core::AppResult;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Catalog rows, their code lookup and their vectors, built together.
#[derive(Debug)]
pub struct IndexSnapshot {
    entries: Vec<CatalogEntry>,
    rows_by_code: HashMap<String, Vec<usize>>,
    index: FlatIndex,
    built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    /// Embed every entry and build the index.
    pub async fn build(
        entries: Vec<CatalogEntry>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> AppResult<Self> {
        let start = Instant::now();

        if entries.is_empty() {
            tracing::warn!("Catalog is empty; searches will return no codes");
        }

        let texts: Vec<String> = entries.iter().map(CatalogEntry::searchable_text).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size.max(1)) {
            vectors.extend(provider.embed_batch(batch).await?);
        }

        let index = FlatIndex::build(provider.dimensions(), vectors)?;

        let mut rows_by_code: HashMap<String, Vec<usize>> = HashMap::new();
        for (row, entry) in entries.iter().enumerate() {
            rows_by_code.entry(entry.code.clone()).or_default().push(row);
        }

        tracing::info!(
            "Indexed {} rows ({} codes) with {} in {}ms",
            entries.len(),
            rows_by_code.len(),
            provider.provider_name(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            entries,
            rows_by_code,
            index,
            built_at: Utc::now(),
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, row: usize) -> Option<&CatalogEntry> {
        self.entries.get(row)
    }

    /// All rows sharing `code`, in catalog order.
    pub fn rows_for_code(&self, code: &str) -> Vec<&CatalogEntry> {
        self.rows_by_code
            .get(code)
            .map(|rows| rows.iter().filter_map(|r| self.entries.get(*r)).collect())
            .unwrap_or_default()
    }

    /// Distinct codes in the catalog.
    pub fn code_count(&self) -> usize {
        self.rows_by_code.len()
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Holds the current snapshot and serializes rebuilds.
#[derive(Debug)]
pub struct CatalogStore {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    current: RwLock<Arc<IndexSnapshot>>,
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl CatalogStore {
    /// Build the initial snapshot.
    pub async fn build(
        entries: Vec<CatalogEntry>,
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> AppResult<Self> {
        let snapshot = IndexSnapshot::build(entries, provider.as_ref(), batch_size).await?;
        Ok(Self {
            provider,
            batch_size,
            current: RwLock::new(Arc::new(snapshot)),
            rebuild_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The snapshot searches should read.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Replace the catalog with `entries`.
    ///
    /// At most one rebuild runs at a time; concurrent callers wait their turn.
    /// On failure the previous snapshot stays in place.
    pub async fn rebuild(&self, entries: Vec<CatalogEntry>) -> AppResult<()> {
        let _guard = self.rebuild_lock.lock().await;

        tracing::info!("Rebuilding index for {} rows", entries.len());
        let snapshot = IndexSnapshot::build(entries, self.provider.as_ref(), self.batch_size).await?;

        let mut current = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = Arc::new(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::vector_index::VectorIndex;
    use medbill_core::AppError;

    fn sample() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("H102", "Minor assessment", "", "$37.95"),
            CatalogEntry::new("H132", "Minor assessment - Evening", "", "$45.00"),
            CatalogEntry::new("Z107", "Incision & Drainage", "", "$85.00"),
        ]
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn provider_name(&self) -> &str {
            "failing"
        }
        fn model_name(&self) -> &str {
            "none"
        }
        fn dimensions(&self) -> usize {
            8
        }
        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Err(AppError::Embedding("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_snapshot_groups_rows_by_code() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(64));
        let mut entries = sample();
        entries.push(CatalogEntry::new("H102", "Minor assessment - Night", "", "$60.00"));

        let store = CatalogStore::build(entries, provider, 2).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.entries().len(), 4);
        assert_eq!(snapshot.code_count(), 3);
        assert_eq!(snapshot.rows_for_code("H102").len(), 2);
        assert!(snapshot.rows_for_code("G004").is_empty());
        assert_eq!(snapshot.index().len(), 4);
    }

    #[tokio::test]
    async fn test_rebuild_swaps_snapshot() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(64));
        let store = CatalogStore::build(sample(), provider, 10).await.unwrap();
        let before = store.snapshot();

        store
            .rebuild(vec![CatalogEntry::new("G004", "Critical Care", "", "$150.00")])
            .await
            .unwrap();

        // Readers holding the old snapshot are unaffected.
        assert_eq!(before.entries().len(), 3);
        assert_eq!(store.snapshot().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_error() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(FailingProvider);
        let err = CatalogStore::build(sample(), provider, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_catalog_builds() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(64));
        let store = CatalogStore::build(Vec::new(), provider, 10).await.unwrap();
        assert!(store.snapshot().is_empty());
    }
}
