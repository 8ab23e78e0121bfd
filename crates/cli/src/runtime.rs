//! Shared command setup: configuration, engine and narrative generator.

use crate::fallback;
use anyhow::Context;
use medbill_core::{config::AppConfig, AppError};
use medbill_llm::{create_client, ChatMessage};
use medbill_retrieval::config::load_config;
use medbill_retrieval::narrative::DEFAULT_OPENROUTER_MODEL;
use medbill_retrieval::{NarrativeGenerator, RetrievalConfig, RetrievalEngine};
use std::path::Path;

/// Resolved settings every command starts from.
#[derive(Debug)]
pub struct Runtime {
    pub app: AppConfig,
    pub retrieval: RetrievalConfig,
    fallback_catalog: bool,
}

impl Runtime {
    pub fn new(app: AppConfig, fallback_catalog: bool) -> anyhow::Result<Self> {
        let retrieval = load_config(&app.workspace).with_context(|| {
            format!(
                "Failed to load retrieval config from {}",
                app.workspace.display()
            )
        })?;

        Ok(Self {
            app,
            retrieval,
            fallback_catalog,
        })
    }

    /// Open the engine with the workspace retrieval settings.
    pub async fn engine(&self) -> anyhow::Result<RetrievalEngine> {
        self.engine_with(&self.retrieval).await
    }

    /// Open the engine with adjusted retrieval settings.
    ///
    /// A catalog that cannot be loaded is replaced by the sample catalog
    /// when `--fallback-catalog` was given.
    pub async fn engine_with(&self, retrieval: &RetrievalConfig) -> anyhow::Result<RetrievalEngine> {
        match medbill_retrieval::open(&self.app.workspace, retrieval).await {
            Ok(engine) => Ok(engine),
            Err(AppError::DataLoad(reason)) if self.fallback_catalog => {
                tracing::warn!("{}; using the built-in sample catalog", reason);
                RetrievalEngine::from_config(retrieval, fallback::sample_catalog())
                    .await
                    .context("Failed to index the sample catalog")
            }
            Err(e) => Err(e).with_context(|| {
                format!(
                    "Failed to open billing catalog {}",
                    retrieval.resolve_catalog_path(&self.app.workspace).display()
                )
            }),
        }
    }

    /// Narrative generator for the configured provider, or `None` if one
    /// cannot be set up. Narrative is optional, so setup problems only warn.
    pub fn narrator(&self) -> Option<NarrativeGenerator> {
        match self.try_narrator() {
            Ok(narrator) => Some(narrator),
            Err(e) => {
                tracing::warn!("Narrative disabled: {:#}", e);
                None
            }
        }
    }

    fn try_narrator(&self) -> anyhow::Result<NarrativeGenerator> {
        self.app.validate()?;

        let endpoint = self.app.provider_endpoint(&self.app.provider);
        let api_key = self.app.resolve_api_key(&self.app.provider);
        let client = create_client(&self.app.provider, endpoint.as_deref(), api_key.as_deref())?;

        let narrator = NarrativeGenerator::from_workspace(
            &self.app.workspace,
            client,
            self.narrative_model(),
            self.retrieval.narrative.clone(),
        )?;
        Ok(narrator)
    }

    /// OpenRouter gets its free default model unless a model was configured.
    fn narrative_model(&self) -> String {
        if let Some(provider) = self.app.get_provider_config(&self.app.provider) {
            if self.app.model == AppConfig::default().model {
                return provider.model().to_string();
            }
        } else if self.app.provider == "openai" && self.app.model == AppConfig::default().model {
            return DEFAULT_OPENROUTER_MODEL.to_string();
        }
        self.app.model.clone()
    }
}

/// Read conversation history from a JSON array of `{role, content}` objects.
pub fn load_history(path: &Path) -> anyhow::Result<Vec<ChatMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    let history: Vec<ChatMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("History file {} is not a JSON message list", path.display()))?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medbill_llm::ChatRole;
    use tempfile::TempDir;

    fn runtime(provider: &str) -> Runtime {
        let app = AppConfig {
            provider: provider.to_string(),
            ..AppConfig::default()
        };
        Runtime {
            app,
            retrieval: RetrievalConfig::default(),
            fallback_catalog: false,
        }
    }

    #[test]
    fn test_openrouter_default_model() {
        assert_eq!(runtime("openai").narrative_model(), DEFAULT_OPENROUTER_MODEL);
        assert_eq!(runtime("ollama").narrative_model(), "llama3.2");
    }

    #[test]
    fn test_load_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[{"role":"user","content":"chest pain"},{"role":"assistant","content":"G004"}]"#,
        )
        .unwrap();

        let history = load_history(&path).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_missing_catalog_uses_fallback_when_allowed() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime("ollama");
        rt.app.workspace = dir.path().to_path_buf();

        let err = rt.engine().await.unwrap_err();
        assert!(err
            .chain()
            .any(|c| matches!(c.downcast_ref::<AppError>(), Some(AppError::DataLoad(_)))));

        rt.fallback_catalog = true;
        let engine = rt.engine().await.unwrap();
        assert_eq!(
            engine.store().snapshot().entries().len(),
            fallback::sample_catalog().len()
        );
    }
}
