//! Command handlers for the coursebrief CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod plan;
pub mod prompts;
pub mod summarize;

// Re-export command types for convenience
pub use plan::PlanCommand;
pub use prompts::PromptsCommand;
pub use summarize::SummarizeCommand;
