//! Optimize command handler.
//!
//! Builds a billing plan for an encounter context.

use crate::output::{print_json, print_suggested, print_tips};
use crate::runtime::Runtime;
use clap::Args;
use medbill_retrieval::{Complexity, RevenueAdvisor, RevenueContext, TimeOfDay};
use serde_json::json;
use std::sync::Arc;

/// Build a billing plan for an encounter
#[derive(Args, Debug)]
pub struct OptimizeCommand {
    /// Patient type, e.g. adult or pediatric
    #[arg(long, default_value = "adult")]
    pub patient_type: String,

    /// regular, evening, night, weekend or holiday (default: from the current time)
    #[arg(long)]
    pub time_of_day: Option<String>,

    /// minor, moderate or high
    #[arg(long, default_value = "moderate")]
    pub complexity: String,

    /// Procedure performed; repeat for several
    #[arg(long = "procedure")]
    pub procedures: Vec<String>,

    /// Ask the configured LLM for optimization advice
    #[arg(long)]
    pub narrative: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl OptimizeCommand {
    pub async fn execute(&self, runtime: &Runtime) -> anyhow::Result<()> {
        tracing::info!("Executing optimize command");
        tracing::debug!("Optimize options: {:?}", self);

        let time_of_day = match self.time_of_day {
            Some(ref value) => TimeOfDay::parse(value)?,
            None => TimeOfDay::from_datetime(&chrono::Local::now()),
        };
        let context = RevenueContext {
            patient_type: self.patient_type.clone(),
            time_of_day,
            complexity: Complexity::parse(&self.complexity)?,
            procedures: self.procedures.clone(),
        };

        let engine = Arc::new(runtime.engine().await?);
        let advisor = RevenueAdvisor::new(Arc::clone(&engine));
        let plan = advisor.optimize(&context).await?;

        let advice = if self.narrative {
            match runtime.narrator() {
                Some(narrator) => {
                    let found = engine.search_with_context(&context).await?;
                    narrator.advise(&context, &found).await
                }
                None => None,
            }
        } else {
            None
        };

        if self.json {
            return print_json(&json!({ "plan": plan, "advice": advice }));
        }

        println!(
            "Encounter: {} patient, {} complexity, {}",
            context.patient_type, context.complexity, context.time_of_day
        );
        println!();
        print_suggested("PRIMARY", &plan.primary_codes);
        print_suggested("PREMIUMS (confirm eligibility)", &plan.premium_codes);
        print_suggested("ADD-ONS", &plan.add_on_codes);
        println!(
            "Estimated revenue: ${:.2}",
            plan.total_estimated_revenue
        );
        println!();
        print_tips("TIPS", &plan.optimization_tips);

        if let Some(advice) = advice {
            println!("{}", advice);
        }
        Ok(())
    }
}
