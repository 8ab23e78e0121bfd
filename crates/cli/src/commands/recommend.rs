//! Recommend command handler.

use crate::output::{print_candidates, print_json, print_tips};
use crate::runtime::Runtime;
use clap::Args;
use medbill_retrieval::RevenueAdvisor;
use std::sync::Arc;

/// Canadian billing recommendation for a query
#[derive(Args, Debug)]
pub struct RecommendCommand {
    /// Clinical query
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RecommendCommand {
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<()> {
        tracing::info!("Executing recommend command");

        let query = self.query.join(" ");
        let advisor = RevenueAdvisor::new(Arc::new(runtime.engine().await?));
        let recommendation = advisor.recommend(&query).await?;

        if self.json {
            return print_json(&recommendation);
        }

        println!("Encounter type: {}", recommendation.encounter_type);
        println!();
        print_candidates("PRIMARY", &recommendation.primary_recommendations);
        println!();

        let groups = &recommendation.add_on_groups;
        for (title, codes) in [
            ("PROCEDURES", &groups.procedures),
            ("ASSESSMENTS", &groups.assessments),
            ("ANESTHESIA", &groups.anesthesia),
            ("FORMS", &groups.forms),
        ] {
            if !codes.is_empty() {
                print_candidates(title, codes);
                println!();
            }
        }

        print_tips("REVENUE", &recommendation.revenue_tips);
        print_tips("DOCUMENTATION", &recommendation.documentation_tips);
        Ok(())
    }
}
