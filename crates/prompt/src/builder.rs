//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use coursebrief_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// The template is rendered with Handlebars (HTML escaping disabled) and the
/// definition's system instruction and token cap are carried over.
///
/// # Example
/// ```no_run
/// use coursebrief_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("content".to_string(), "Lesson transcript".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let rendered = render_template(&definition.template, &variables)?;
    Ok(BuiltPrompt::new(definition, rendered, &variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn create_test_definition(template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "lesson".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
            },
            system: Some("Explain directly.".to_string()),
            template: template.to_string(),
            max_tokens: Some(256),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), "Hello, world!".to_string());

        let result = render_template("Text: {{content}}", &vars);
        assert_eq!(result.unwrap(), "Text: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape_markup() {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), "<b>a & b</b>".to_string());

        assert_eq!(render_template("{{content}}", &vars).unwrap(), "<b>a & b</b>");
    }

    #[test]
    fn test_build_prompt_carries_definition_settings() {
        let def = create_test_definition("{{content}}");
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), "Transcript".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Transcript");
        assert_eq!(built.system.as_deref(), Some("Explain directly."));
        assert_eq!(built.max_tokens, Some(256));
        assert_eq!(built.metadata.resolved_variables, vec!["content".to_string()]);
    }

    #[test]
    fn test_conditional_block() {
        let def = create_test_definition("Describe.{{#if content}} Alt: {{content}}{{/if}}");

        let empty = build_prompt(&def, HashMap::new()).unwrap();
        assert_eq!(empty.user, "Describe.");

        let mut vars = HashMap::new();
        vars.insert("content".to_string(), "a cat".to_string());
        assert_eq!(build_prompt(&def, vars).unwrap().user, "Describe. Alt: a cat");
    }

    #[test]
    fn test_malformed_template_is_error() {
        let def = create_test_definition("{{#if content}}unterminated");
        let result = build_prompt(&def, HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
