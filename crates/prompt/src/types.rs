//! Prompt types for coursebrief.
//!
//! This module defines the domain entities for the prompt system.

use coursebrief_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of prompts the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Direct summary of a whole lesson text.
    Lesson,
    /// Explanation of one chunk during the map phase.
    Chunk,
    /// Reduction of joined chunk explanations into one account.
    Synthesis,
    /// Description of a single image.
    Image,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [Self::Lesson, Self::Chunk, Self::Synthesis, Self::Image];

    /// Parse a prompt kind. Unknown names are a configuration error.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "lesson" => Ok(Self::Lesson),
            "chunk" => Ok(Self::Chunk),
            "synthesis" => Ok(Self::Synthesis),
            "image" => Ok(Self::Image),
            other => Err(AppError::Config(format!(
                "Unknown prompt kind: '{}'. Expected one of: lesson, chunk, synthesis, image",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Chunk => "chunk",
            Self::Synthesis => "synthesis",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt identifier; matches the kind name for built-ins
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    pub behavior: PromptBehavior,

    /// System instruction sent ahead of the user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax; `{{content}}` is the input text
    pub template: String,

    /// Generation cap for this prompt
    #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Output specification
    pub output: PromptOutputSpec,
}

/// Behavioral settings for prompt execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Tone (e.g., "authoritative", "neutral")
    pub tone: String,

    /// Style (e.g., "concise", "detailed")
    pub style: String,
}

/// Output specification for the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    /// Output format (e.g., "text", "markdown")
    pub format: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Generation cap carried over from the definition
    pub max_tokens: Option<u32>,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Names of the template variables that were supplied
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: Vec<String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        definition: &PromptDefinition,
        user: String,
        variables: &HashMap<String, String>,
    ) -> Self {
        let mut resolved_variables: Vec<String> = variables.keys().cloned().collect();
        resolved_variables.sort();

        Self {
            system: definition.system.clone(),
            user,
            max_tokens: definition.max_tokens,
            metadata: BuiltPromptMetadata {
                source_prompt_id: definition.id.clone(),
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_kind_parsing() {
        assert_eq!(PromptKind::parse("lesson").unwrap(), PromptKind::Lesson);
        assert_eq!(PromptKind::parse(" Synthesis ").unwrap(), PromptKind::Synthesis);
        for kind in PromptKind::ALL {
            assert_eq!(PromptKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_prompt_kind_is_config_error() {
        match PromptKind::parse("practical_theoretical") {
            Err(AppError::Config(msg)) => assert!(msg.contains("practical_theoretical")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: lesson
title: Test Prompt
apiVersion: "1.0"
createdBy: test
behavior:
  tone: professional
  style: concise
system: "Explain directly."
template: "{{content}}"
maxTokens: 500
output:
  format: markdown
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "lesson");
        assert_eq!(def.behavior.tone, "professional");
        assert_eq!(def.system.as_deref(), Some("Explain directly."));
        assert_eq!(def.max_tokens, Some(500));
    }
}
