//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use medbill_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system template (if any) and the user template are rendered with
/// the same variables. HTML escaping is disabled since the output is plain
/// text for an LLM.
///
/// # Example
/// ```no_run
/// use medbill_prompt::{build_prompt, builtin_prompt, NARRATIVE_PROMPT_ID};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(NARRATIVE_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "chest pain".to_string());
/// vars.insert("context".to_string(), "- H102: Minor assessment ($37.95)".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = match definition.system {
        Some(ref template) => Some(render_template(template, &variables)?),
        None => None,
    };
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn create_test_definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
                temperature: None,
                max_tokens: None,
            },
            system: system.map(str::to_string),
            template: "Query: {{query}}".to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "fracture & cast".to_string());

        let result = render_template("Query: {{query}}", &vars).unwrap();
        assert_eq!(result, "Query: fracture & cast");
    }

    #[test]
    fn test_build_prompt_renders_system() {
        let def = create_test_definition(Some("Region: {{region}}"));
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "laceration".to_string());
        vars.insert("region".to_string(), "Ontario".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.system.as_deref(), Some("Region: Ontario"));
        assert_eq!(built.user, "Query: laceration");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_prompt_without_system() {
        let def = create_test_definition(None);
        let built = build_prompt(&def, HashMap::new()).unwrap();
        assert!(built.system.is_none());
        assert_eq!(built.user, "Query: ");
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let result = render_template("{{#if query}}unclosed", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
