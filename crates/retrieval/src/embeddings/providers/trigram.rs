//! Character-trigram hashing provider.

use crate::embeddings::provider::EmbeddingProvider;
use medbill_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "on", "a", "an", "as", "are", "was", "for", "to", "of", "in", "and",
    "or", "with", "by", "from", "this", "that", "be", "per", "each", "when", "if", "may",
];

/// Weight of a whole-word bucket relative to one trigram bucket.
const WORD_WEIGHT: f32 = 2.0;

/// Local, offline embedding provider.
///
/// Each token contributes to buckets chosen by hashing its padded character
/// trigrams, plus one bucket for the whole token. Related spellings
/// ("fracture", "fractures") share most trigrams and land close together.
/// Deterministic and dependency-free, but not semantic.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, bytes: &[u8]) -> usize {
        // FNV-1a
        let hash = bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
            (acc ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn tokens(text: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1 && !STOP_WORDS.contains(t))
        {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
        counts
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for (token, count) in Self::tokens(text) {
            let weight = (count as f32).sqrt();

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(trigram.as_bytes())] += weight;
            }

            vector[self.bucket(token.as_bytes())] += WORD_WEIGHT * weight;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
