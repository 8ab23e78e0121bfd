//! Search command handler.
//!
//! Runs a billing-code search and optionally attaches a narrative.

use crate::output::{print_json, print_search_result};
use crate::runtime::{load_history, Runtime};
use anyhow::{bail, Context};
use clap::Args;
use medbill_retrieval::PolicyKind;
use std::path::PathBuf;

/// Search billing codes for a clinical query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Clinical query, e.g. "chest pain at night"
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Categorization policy (canadian_hierarchy, threshold_based)
    #[arg(long)]
    pub policy: Option<String>,

    /// Maximum number of index candidates to consider
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Ask the configured LLM for a narrative explanation
    #[arg(long)]
    pub narrative: bool,

    /// JSON file with earlier conversation turns for the narrative
    #[arg(long, requires = "narrative")]
    pub history: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search options: {:?}", self);

        let query = self.query.join(" ");
        if query.trim().is_empty() {
            bail!("Query is empty");
        }

        let mut retrieval = runtime.retrieval.clone();
        if let Some(ref policy) = self.policy {
            retrieval.search.policy = PolicyKind::parse(policy).with_context(|| {
                format!(
                    "Unknown policy '{}'. Expected canadian_hierarchy or threshold_based",
                    policy
                )
            })?;
        }
        if let Some(top_k) = self.top_k {
            retrieval.search.top_k = Some(top_k);
        }

        let engine = runtime.engine_with(&retrieval).await?;

        let wants_narrative = self.narrative || retrieval.narrative.enabled;
        let narrator = if wants_narrative { runtime.narrator() } else { None };

        let result = match narrator {
            Some(ref narrator) => {
                let history = match self.history {
                    Some(ref path) => load_history(path)?,
                    None => Vec::new(),
                };
                engine
                    .search_with_narrative(&query, narrator, &history)
                    .await?
            }
            None => engine.search(&query).await?,
        };

        if self.json {
            print_json(&result)
        } else {
            print_search_result(&result);
            Ok(())
        }
    }
}
