//! LLM integration crate for coursebrief.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models (LLMs). Providers sit behind the [`LlmClient`]
//! trait and report failures as classified `AppError::Service` values.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Any chat-completions compatible endpoint
//! - **Mock**: Scripted replies for tests and dry runs
//!
//! # Example
//! ```no_run
//! use coursebrief_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockClient, MockReply, OllamaClient, OpenAiClient};
pub use types::ProviderType;
