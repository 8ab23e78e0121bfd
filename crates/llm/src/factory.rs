//! LLM provider factory.
//!
//! Resolves a provider name to a concrete client. Secrets are passed in by
//! the caller; this module never reads the environment itself.

use crate::client::LlmClient;
use crate::providers::openai::OPENROUTER_BASE_URL;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use medbill_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Default per-request HTTP timeout for LLM calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai"/"openrouter")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required for OpenAI-compatible providers)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// secret is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_timeout(base_url, DEFAULT_TIMEOUT)?;
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI-compatible provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(OPENROUTER_BASE_URL);
            let client = OpenAiCompatClient::new(base_url, api_key, DEFAULT_TIMEOUT)?;
            Ok(Arc::new(client))
        }
    }
}
