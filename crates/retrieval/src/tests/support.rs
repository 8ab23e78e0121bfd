//! Deterministic embedding providers and LLM clients for tests.

use crate::config::SearchConfig;
use crate::embeddings::EmbeddingProvider;
use crate::engine::RetrievalEngine;
use crate::store::CatalogStore;
use crate::types::CatalogEntry;
use medbill_core::{AppError, AppResult};
use medbill_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Keyword presence vectors: one dimension per vocabulary word plus a small
/// constant so no vector is all zeros.
#[derive(Debug)]
pub struct KeywordProvider {
    vocabulary: Vec<&'static str>,
    fail: AtomicBool,
}

pub const VOCABULARY: &[&str] = &[
    "critical",
    "care",
    "chest",
    "pain",
    "assessment",
    "fracture",
    "tube",
];

impl KeywordProvider {
    pub fn new() -> Self {
        Self {
            vocabulary: VOCABULARY.to_vec(),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every later call fail with an embedding error.
    pub fn go_down(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len() + 1
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("keyword backend offline".to_string()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Every catalog row scores exactly `score` against every query.
///
/// Rows are recognised by the `DOCROW` marker in their description.
#[derive(Debug)]
pub struct FixedScoreProvider {
    pub score: f32,
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedScoreProvider {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed-test"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let row = vec![self.score, (1.0 - self.score * self.score).sqrt()];
        Ok(texts
            .iter()
            .map(|t| {
                if t.contains("DOCROW") {
                    row.clone()
                } else {
                    vec![1.0, 0.0]
                }
            })
            .collect())
    }
}

/// Each catalog row scores a chosen cosine similarity against any query.
///
/// Rows are recognised by the billing code that starts their searchable text.
/// Row `i` gets `score * e0 + sqrt(1 - score^2) * e(i + 1)` and every query is
/// `e0`, so the score survives normalization exactly.
#[derive(Debug)]
pub struct CodeScoreProvider {
    scores: Vec<(&'static str, f32)>,
}

impl CodeScoreProvider {
    pub fn new(scores: &[(&'static str, f32)]) -> Self {
        Self {
            scores: scores.to_vec(),
        }
    }

    fn slot(&self, text: &str) -> Option<(usize, f32)> {
        let code = text.split_whitespace().next()?;
        let lookup: HashMap<&str, (usize, f32)> = self
            .scores
            .iter()
            .enumerate()
            .map(|(i, (code, score))| (*code, (i, *score)))
            .collect();
        lookup.get(code).copied()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CodeScoreProvider {
    fn provider_name(&self) -> &str {
        "code-score"
    }

    fn model_name(&self) -> &str {
        "code-score-test"
    }

    fn dimensions(&self) -> usize {
        self.scores.len() + 1
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0; self.dimensions()];
                match self.slot(text) {
                    Some((i, score)) => {
                        vector[0] = score;
                        vector[i + 1] = (1.0 - score * score).sqrt();
                    }
                    None => vector[0] = 1.0,
                }
                vector
            })
            .collect())
    }
}

pub async fn engine_with(
    entries: Vec<CatalogEntry>,
    provider: Arc<dyn EmbeddingProvider>,
) -> RetrievalEngine {
    let store = CatalogStore::build(entries, provider, 4).await.unwrap();
    RetrievalEngine::new(Arc::new(store), SearchConfig::default())
}

/// The small emergency catalog most pipeline tests search.
pub fn er_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("G004", "Critical care, first 15 minutes", "Life threatening", "$150.00"),
        CatalogEntry::new("H152", "Comprehensive assessment for chest pain", "Night", "$75.00"),
        CatalogEntry::new("Z107", "Chest tube insertion", "", "$85.00"),
        CatalogEntry::new("F005", "Fracture reduction, forearm", "Closed", "$120.00"),
        CatalogEntry::new("E412", "After hours premium, evening", "", "$20.00"),
        CatalogEntry::new("E413", "After hours premium, night", "", "$30.00"),
    ]
}

/// Three-row catalog from the critical care walkthrough, rows as written.
pub fn walkthrough_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("H152", "Comprehensive Assessment", "", "$75.00"),
        CatalogEntry::new("G004", "Critical Care", "", "$150.00"),
        CatalogEntry::new("Z107", "Incision & Drainage", "", "$85.00"),
    ]
}

/// LLM client with a scripted reply, optional delay and request log.
pub struct ScriptedClient {
    pub reply: Result<String, String>,
    pub delay: Option<Duration>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    pub fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            reply: Ok("late".to_string()),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(1, 1),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}
