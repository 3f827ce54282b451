//! Prompts command handler.

use clap::Args;
use coursebrief_core::{config::AppConfig, AppResult};
use coursebrief_prompt::{list_prompts, PromptKind, PromptLibrary};
use std::path::PathBuf;

/// List prompt definitions and where each comes from
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Override directory to inspect (default: configured prompts_dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl PromptsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let dir = self.dir.clone().or_else(|| config.prompts_dir.clone());
        tracing::info!("Executing prompts command (overrides: {:?})", dir);

        let overridden = match dir.as_deref() {
            Some(dir) if dir.is_dir() => list_prompts(dir)?,
            Some(dir) => {
                tracing::warn!("Prompt directory {:?} does not exist", dir);
                Vec::new()
            }
            None => Vec::new(),
        };

        // Loading validates every definition, overrides included.
        let library = PromptLibrary::load(dir.as_deref())?;

        for kind in PromptKind::ALL {
            let def = library.definition(kind)?;
            let origin = if overridden.contains(&kind) {
                "override"
            } else {
                "built-in"
            };
            println!("{:<10} {:<9} {} ({})", kind.as_str(), origin, def.title, def.id);
        }

        Ok(())
    }
}
