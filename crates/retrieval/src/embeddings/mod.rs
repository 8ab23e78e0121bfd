//! Embedding providers for catalog entries and queries.
//!
//! A provider turns text into fixed-size vectors. The index and every query
//! must use the same provider (and therefore the same dimensions).

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
