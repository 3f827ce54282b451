//! Prompt system for coursebrief.
//!
//! This crate provides structured prompt management with:
//! - A closed set of prompt kinds used by the summarization pipeline
//! - YAML-based prompt definitions, built in and overridable from disk
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, PromptLibrary};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptKind,
    PromptOutputSpec,
};
