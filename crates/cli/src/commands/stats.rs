//! Stats command handler.
//!
//! Shows catalog size and revenue patterns.

use crate::output::print_json;
use crate::runtime::Runtime;
use clap::Args;
use medbill_retrieval::RevenueAdvisor;
use serde_json::json;
use std::sync::Arc;

/// Catalog and revenue statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let engine = Arc::new(runtime.engine().await?);
        let snapshot = engine.store().snapshot();
        let provider = engine.store().provider();
        let patterns = RevenueAdvisor::new(Arc::clone(&engine)).analyze_revenue_patterns();

        if self.json {
            return print_json(&json!({
                "rows": snapshot.entries().len(),
                "codes": snapshot.code_count(),
                "builtAt": snapshot.built_at(),
                "embedding": {
                    "provider": provider.provider_name(),
                    "model": provider.model_name(),
                    "dimensions": provider.dimensions(),
                },
                "revenue": patterns,
            }));
        }

        println!(
            "Catalog: {} rows, {} codes (indexed {})",
            snapshot.entries().len(),
            snapshot.code_count(),
            snapshot.built_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!(
            "Embeddings: {} / {} ({} dims)",
            provider.provider_name(),
            provider.model_name(),
            provider.dimensions()
        );
        println!();

        println!("{:<26} {:>6} {:>12} {:>10}", "CATEGORY", "CODES", "TOTAL", "MEAN");
        for c in &patterns.by_category {
            println!(
                "{:<26} {:>6} {:>12.2} {:>10.2}",
                c.category.label(),
                c.count,
                c.sum,
                c.mean
            );
        }
        println!();

        println!("TOP CODES BY AMOUNT");
        for code in &patterns.top_codes {
            println!(
                "  {:<6} {:>10.2}  {}",
                code.code, code.numeric_amount, code.description
            );
        }
        Ok(())
    }
}
