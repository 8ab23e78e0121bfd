//! Built-in billing prompts.
//!
//! These ship with the binary so the narrative works without any workspace
//! setup. A file at `.medbill/prompts/<id>.yml` replaces the built-in of the
//! same id.

use crate::loader::validate_prompt;
use crate::types::PromptDefinition;
use medbill_core::{AppError, AppResult};

/// Narrative over ranked search results.
pub const NARRATIVE_PROMPT_ID: &str = "billing.narrative";

/// Narrative over an encounter context (patient type, time, complexity).
pub const OPTIMIZATION_PROMPT_ID: &str = "billing.optimization";

const NARRATIVE_YAML: &str = r#"
id: billing.narrative
title: "Canadian Billing Narrative"
apiVersion: "1.0"
behavior:
  tone: advisory
  style: detailed
  temperature: 0.3
  maxTokens: 1000
system: "You are a medical billing expert AI assistant specializing in Canadian healthcare billing codes and revenue optimization."
template: |
  You are a Canadian medical billing expert AI assistant. Based on the search results below, provide a comprehensive analysis following Canadian billing hierarchy.

  SEARCH QUERY: "{{query}}"

  {{context}}

  CANADIAN BILLING STRUCTURE:
  - PRIMARY CODES: Suggest exactly 2 primary codes
    * G codes for Critical Care encounters (can be added multiple times for 15-minute reassessments)
    * H codes for regular Emergency Medicine encounters
  - ADD-ON CODES: Additional codes for procedures, mental health assessments, forms, or anesthesia
    * Z codes for procedures
    * A codes for assessments
    * E codes for anesthesia
    * P codes for forms/consultations

  Please provide:
  1. **Primary Code Recommendation**: Suggest exactly 2 primary codes (G or H codes)
  2. **Add-on Code Suggestions**: Additional codes for procedures, assessments, forms, anesthesia
  3. **Revenue Optimization**: How to maximize billing with proper code combinations
  4. **Documentation Requirements**: What to document to support these codes
  5. **Time-based Billing**: For G codes, explain 15-minute reassessment billing

  Focus on Canadian healthcare billing practices and revenue optimization.
output:
  format: markdown
"#;

const OPTIMIZATION_YAML: &str = r#"
id: billing.optimization
title: "Encounter Revenue Optimization"
apiVersion: "1.0"
behavior:
  tone: advisory
  style: concise
  temperature: 0.3
  maxTokens: 800
system: "You are a medical billing expert focused on revenue optimization."
template: |
  Based on the following patient context and billing codes, provide revenue optimization suggestions:

  CONTEXT:
  {{context}}

  BILLING CODES FOUND:
  Primary Codes: {{primary_count}}
  Add-on Codes: {{addon_count}}

  Please provide:
  1. Recommended primary billing codes
  2. Suggested add-on codes for revenue optimization
  3. Time-based premium opportunities
  4. Documentation requirements
  5. Revenue maximization strategies

  Focus on practical, actionable advice for medical billing optimization.
output:
  format: markdown
"#;

/// Look up a built-in prompt by id.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let raw = match prompt_id {
        NARRATIVE_PROMPT_ID => NARRATIVE_YAML,
        OPTIMIZATION_PROMPT_ID => OPTIMIZATION_YAML,
        other => {
            return Err(AppError::Prompt(format!(
                "No built-in prompt named '{}'",
                other
            )))
        }
    };

    let definition: PromptDefinition = serde_yaml::from_str(raw)
        .map_err(|e| AppError::Prompt(format!("Built-in prompt {} is invalid: {}", prompt_id, e)))?;
    validate_prompt(&definition)?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_prompt;
    use std::collections::HashMap;

    #[test]
    fn test_builtins_parse() {
        for id in [NARRATIVE_PROMPT_ID, OPTIMIZATION_PROMPT_ID] {
            let def = builtin_prompt(id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.system.is_some());
        }
    }

    #[test]
    fn test_narrative_renders_query_and_context() {
        let def = builtin_prompt(NARRATIVE_PROMPT_ID).unwrap();
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "chest pain".to_string());
        vars.insert(
            "context".to_string(),
            "PRIMARY CODES (Most Relevant):\n- G004: Critical care ($120.00)".to_string(),
        );

        let built = build_prompt(&def, vars).unwrap();
        assert!(built.user.contains("SEARCH QUERY: \"chest pain\""));
        assert!(built.user.contains("- G004: Critical care ($120.00)"));
        assert!(built.user.contains("Suggest exactly 2 primary codes"));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("billing.unknown").is_err());
    }
}
