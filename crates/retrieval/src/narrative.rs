//! Optional language-model narrative over search results.
//!
//! Narrative is best effort. Every failure, including a timeout, is logged
//! and turned into `None` so the structured result is still served.

use crate::advisor::RevenueContext;
use crate::config::NarrativeConfig;
use crate::revenue;
use crate::types::{ScoredCandidate, SearchResult};
use medbill_core::{AppError, AppResult};
use medbill_llm::{ChatMessage, LlmClient, LlmRequest};
use medbill_prompt::{
    build_prompt, builtin_prompt, resolve_prompt, PromptDefinition, NARRATIVE_PROMPT_ID,
    OPTIMIZATION_PROMPT_ID,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Free OpenRouter model used when none is configured.
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";

/// Render the code listing and revenue summary the prompt is built around.
///
/// Only the first `per_group` primary and add-on codes are listed, and the
/// summary totals cover exactly the listed codes.
pub fn build_context(result: &SearchResult, per_group: usize) -> String {
    let primary = &result.primary_codes[..per_group.min(result.primary_codes.len())];
    let add_on = &result.add_on_codes[..per_group.min(result.add_on_codes.len())];
    let totals = revenue::breakdown(primary, add_on);

    let mut context = String::from("Medical Billing Codes Search Results:\n\n");
    context.push_str("PRIMARY CODES (Most Relevant):\n");
    push_codes(&mut context, primary);

    context.push_str("\nADD-ON CODES (Revenue Boosters):\n");
    push_codes(&mut context, add_on);

    context.push_str("\nREVENUE SUMMARY:\n");
    context.push_str(&format!(
        "- Primary Codes Revenue: ${:.2}\n",
        totals.primary.sum
    ));
    context.push_str(&format!(
        "- Add-on Codes Revenue: ${:.2}\n",
        totals.add_on.sum
    ));
    context.push_str(&format!("- Total Potential Revenue: ${:.2}\n", totals.total));
    context
}

fn push_codes(out: &mut String, codes: &[ScoredCandidate]) {
    for code in codes {
        out.push_str(&format!(
            "- {}: {} (${:.2})\n",
            code.code, code.description, code.numeric_amount
        ));
    }
}

/// Generates narrative guidance through an [`LlmClient`].
pub struct NarrativeGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    narrative_prompt: PromptDefinition,
    optimization_prompt: PromptDefinition,
    config: NarrativeConfig,
}

impl fmt::Debug for NarrativeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeGenerator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("narrative_prompt", &self.narrative_prompt.id)
            .field("config", &self.config)
            .finish()
    }
}

impl NarrativeGenerator {
    /// Generator using the built-in prompts.
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        config: NarrativeConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            client,
            model: model.into(),
            narrative_prompt: builtin_prompt(NARRATIVE_PROMPT_ID)?,
            optimization_prompt: builtin_prompt(OPTIMIZATION_PROMPT_ID)?,
            config,
        })
    }

    /// Generator using workspace prompt overrides where present.
    pub fn from_workspace(
        workspace: &Path,
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        config: NarrativeConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            client,
            model: model.into(),
            narrative_prompt: resolve_prompt(workspace, NARRATIVE_PROMPT_ID)?,
            optimization_prompt: resolve_prompt(workspace, OPTIMIZATION_PROMPT_ID)?,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Narrative for a search result, or `None` if generation failed.
    ///
    /// `history` holds earlier conversation turns, oldest first.
    pub async fn generate(&self, result: &SearchResult, history: &[ChatMessage]) -> Option<String> {
        let mut variables = HashMap::new();
        variables.insert("query".to_string(), result.query.clone());
        variables.insert(
            "context".to_string(),
            build_context(result, self.config.max_codes_per_group),
        );

        self.bounded(&self.narrative_prompt, variables, history)
            .await
    }

    /// Optimization advice for an encounter context and the codes its
    /// composite query found.
    pub async fn advise(&self, context: &RevenueContext, result: &SearchResult) -> Option<String> {
        let mut variables = HashMap::new();
        variables.insert(
            "context".to_string(),
            format!(
                "Patient type: {}\nTime of day: {}\nComplexity: {}\nProcedures: {}",
                context.patient_type,
                context.time_of_day,
                context.complexity,
                if context.procedures.is_empty() {
                    "none".to_string()
                } else {
                    context.procedures.join(", ")
                }
            ),
        );
        variables.insert("primary_count".to_string(), result.total_primary.to_string());
        variables.insert("addon_count".to_string(), result.total_add_ons.to_string());

        self.bounded(&self.optimization_prompt, variables, &[]).await
    }

    async fn bounded(
        &self,
        prompt: &PromptDefinition,
        variables: HashMap<String, String>,
        history: &[ChatMessage],
    ) -> Option<String> {
        let limit = Duration::from_secs(self.config.timeout_secs);
        let call = self.try_generate(prompt, variables, history);
        let outcome = match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::Narrative(format!(
                "timed out after {}s",
                self.config.timeout_secs
            ))),
        };

        match outcome {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Narrative unavailable ({}): {}", prompt.id, e);
                None
            }
        }
    }

    async fn try_generate(
        &self,
        prompt: &PromptDefinition,
        variables: HashMap<String, String>,
        history: &[ChatMessage],
    ) -> AppResult<String> {
        let built = build_prompt(prompt, variables)?;

        let mut request = LlmRequest::new(built.user, self.model.clone())
            .with_max_tokens(prompt.behavior.max_tokens.unwrap_or(self.config.max_tokens))
            .with_temperature(prompt.behavior.temperature.unwrap_or(self.config.temperature))
            .with_history(history.to_vec());
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Requesting narrative from {} ({}, {} history turns)",
            self.client.provider_name(),
            self.model,
            history.len()
        );

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| AppError::Narrative(e.to_string()))?;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(AppError::Narrative("model returned no text".to_string()));
        }
        Ok(content.to_string())
    }
}
