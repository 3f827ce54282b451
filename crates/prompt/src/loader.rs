//! Prompt loader for built-in and on-disk YAML prompt definitions.

use crate::builder::build_prompt;
use crate::types::{BuiltPrompt, PromptDefinition, PromptKind};
use coursebrief_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

fn builtin_source(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Lesson => include_str!("../prompts/lesson.yml"),
        PromptKind::Chunk => include_str!("../prompts/chunk.yml"),
        PromptKind::Synthesis => include_str!("../prompts/synthesis.yml"),
        PromptKind::Image => include_str!("../prompts/image.yml"),
    }
}

/// Load the definition for `kind`.
///
/// When `prompts_dir` contains `<kind>.yml`, that file replaces the built-in
/// definition. Otherwise the built-in one compiled into the binary is used.
///
/// # Example
/// ```no_run
/// use coursebrief_prompt::{load_prompt, PromptKind};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(PromptKind::Lesson, Some(Path::new("prompts")))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(kind: PromptKind, prompts_dir: Option<&Path>) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        let prompt_file = dir.join(format!("{}.yml", kind.as_str()));
        if prompt_file.is_file() {
            tracing::debug!("Loading prompt override from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    parse_prompt(builtin_source(kind), &format!("built-in {}", kind))
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// List the prompt kinds overridden in `prompts_dir`, sorted by name.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<PromptKind>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut kinds = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                match PromptKind::parse(stem) {
                    Ok(kind) => kinds.push(kind),
                    Err(_) => tracing::warn!("Ignoring unrecognised prompt file: {:?}", path),
                }
            }
        }
    }

    kinds.sort_by_key(|k| k.as_str());
    Ok(kinds)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

/// Every prompt definition the pipeline needs, loaded once per run.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    definitions: HashMap<PromptKind, PromptDefinition>,
}

impl PromptLibrary {
    /// Load all kinds, applying overrides from `prompts_dir`.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        let definitions = PromptKind::ALL
            .iter()
            .map(|&kind| load_prompt(kind, prompts_dir).map(|def| (kind, def)))
            .collect::<AppResult<HashMap<_, _>>>()?;

        Ok(Self { definitions })
    }

    /// The compiled-in definitions only.
    pub fn builtin() -> AppResult<Self> {
        Self::load(None)
    }

    pub fn definition(&self, kind: PromptKind) -> AppResult<&PromptDefinition> {
        self.definitions
            .get(&kind)
            .ok_or_else(|| AppError::Prompt(format!("No definition loaded for prompt '{}'", kind)))
    }

    /// Render the prompt for `kind` around `content`.
    pub fn build(&self, kind: PromptKind, content: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("content".to_string(), content.to_string());
        build_prompt(self.definition(kind)?, variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_override(dir: &Path, name: &str, valid: bool) -> PathBuf {
        let content = if valid {
            format!(
                r#"
id: {}
title: "Custom Prompt"
apiVersion: "1.0"
createdBy: test
behavior:
  tone: casual
  style: concise
system: "Custom system"
template: "Custom: {{{{content}}}}"
output:
  format: markdown
"#,
                name
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = dir.join(format!("{}.yml", name));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_prompts_are_valid() {
        for kind in PromptKind::ALL {
            let def = load_prompt(kind, None).unwrap();
            assert_eq!(def.id, kind.as_str());
        }
    }

    #[test]
    fn test_synthesis_forbids_meta_references() {
        let def = load_prompt(PromptKind::Synthesis, None).unwrap();
        let system = def.system.unwrap();
        assert!(system.contains("previous chunks"));
        assert!(system.contains("summarized text"));
    }

    #[test]
    fn test_override_replaces_builtin() {
        let temp_dir = TempDir::new().unwrap();
        create_override(temp_dir.path(), "lesson", true);

        let def = load_prompt(PromptKind::Lesson, Some(temp_dir.path())).unwrap();
        assert_eq!(def.title, "Custom Prompt");

        // Other kinds still come from the built-ins.
        let chunk = load_prompt(PromptKind::Chunk, Some(temp_dir.path())).unwrap();
        assert_eq!(chunk.id, "chunk");
    }

    #[test]
    fn test_invalid_override_is_error() {
        let temp_dir = TempDir::new().unwrap();
        create_override(temp_dir.path(), "chunk", false);

        let result = load_prompt(PromptKind::Chunk, Some(temp_dir.path()));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        create_override(temp_dir.path(), "synthesis", true);
        create_override(temp_dir.path(), "image", true);
        create_override(temp_dir.path(), "notes", true);

        let kinds = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(kinds, vec![PromptKind::Image, PromptKind::Synthesis]);
    }

    #[test]
    fn test_list_prompts_missing_dir() {
        let kinds = list_prompts(Path::new("/definitely/not/here")).unwrap();
        assert!(kinds.is_empty());
    }

    #[test]
    fn test_library_build() {
        let library = PromptLibrary::builtin().unwrap();
        let built = library.build(PromptKind::Chunk, "Ownership rules").unwrap();
        assert_eq!(built.user, "Ownership rules");
        assert!(built.system.is_some());
        assert_eq!(built.metadata.source_prompt_id, "chunk");
    }
}
