//! Combos command handler.

use crate::output::{print_combinations, print_json};
use crate::runtime::Runtime;
use clap::Args;
use medbill_retrieval::RevenueAdvisor;
use std::sync::Arc;

/// Add-on codes that can be billed with a code
#[derive(Args, Debug)]
pub struct CombosCommand {
    /// Base billing code, e.g. H152
    pub code: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CombosCommand {
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<()> {
        tracing::info!("Executing combos command for {}", self.code);

        let code = self.code.trim().to_uppercase();
        let advisor = RevenueAdvisor::new(Arc::new(runtime.engine().await?));
        let combos = advisor.code_combinations(&code);

        if self.json {
            print_json(&combos)
        } else {
            print_combinations(&code, &combos);
            Ok(())
        }
    }
}
