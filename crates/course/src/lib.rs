//! Course summarization pipeline.
//!
//! Scans a course directory tree, associates supplementary files with their
//! lessons, summarizes every lesson through a generation service (map-reduce
//! for long text) and writes a linked set of Markdown documents.

pub mod aggregate;
pub mod association;
pub mod chunker;
pub mod describe;
pub mod extract;
pub mod layout;
pub mod lesson;
pub mod mapreduce;
pub mod markdown;
pub mod ordering;
pub mod stats;
pub mod summarizer;
pub mod tracking;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use aggregate::{ChapterReport, CourseAggregator, RunReport};
pub use association::{associate, plan_course, ChapterPlan, LessonPlan};
pub use layout::{ChapterLayout, CourseLayout};
pub use ordering::{DigitPrefixPolicy, OrderingKey, OrderingKeyPolicy};
pub use stats::RunStats;
pub use types::{ContentKind, LessonOutcome, LessonStatus, SummaryOutcome, SummaryStatus};

use coursebrief_core::config::fingerprint_key;
use coursebrief_core::{AppConfig, AppResult};
use coursebrief_llm::{create_client, LlmClient};
use coursebrief_prompt::PromptLibrary;
use describe::{ImageDescriber, LlmImageDescriber, NullImageDescriber};
use extract::Extractors;
use lesson::LessonProcessor;
use mapreduce::MapReduceSummarizer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use summarizer::{Summarizer, SummarizerSettings};
use tracking::{tracker_from_config, Tracker};

/// Build the full pipeline around an existing generation client.
pub fn build_aggregator(
    config: &AppConfig,
    client: Arc<dyn LlmClient>,
    tracker: Arc<dyn Tracker>,
    extractors: Extractors,
) -> AppResult<CourseAggregator> {
    let prompts = Arc::new(PromptLibrary::load(config.prompts_dir.as_deref())?);

    let describer: Arc<dyn ImageDescriber> = if config.images.enabled {
        tracing::debug!("Image descriptions enabled (model: {})", config.image_model());
        Arc::new(LlmImageDescriber::new(
            client.clone(),
            prompts.clone(),
            tracker.clone(),
            config.image_model(),
        ))
    } else {
        Arc::new(NullImageDescriber)
    };

    let summarizer = Summarizer::new(
        client,
        prompts,
        tracker.clone(),
        SummarizerSettings {
            model: config.model.clone(),
            temperature: config.temperature,
            retry_delay: Duration::from_millis(config.summarization.retry_delay_ms),
        },
    );

    let processor = LessonProcessor::new(
        extractors,
        describer,
        MapReduceSummarizer::new(summarizer, &config.summarization),
    );

    Ok(CourseAggregator::new(
        processor,
        Arc::new(DigitPrefixPolicy),
        tracker,
    ))
}

/// Output directory for `course`, honoring the configured override.
pub fn output_dir_for(config: &AppConfig, course: &CourseLayout) -> PathBuf {
    config
        .output_dir
        .clone()
        .unwrap_or_else(|| config.resolve_output_dir(Path::new(&course.name)))
}

/// Summarize the course at `course_dir` with the configured provider.
pub async fn summarize_course(config: &AppConfig, course_dir: &Path) -> AppResult<RunReport> {
    config.validate()?;

    let course = CourseLayout::scan(course_dir)?;
    let output_dir = output_dir_for(config, &course);

    let api_key = config.resolve_api_key();
    if let Some(ref key) = api_key {
        tracing::debug!("API key fingerprint: {}", fingerprint_key(key));
    }
    let client = create_client(&config.provider, config.endpoint.as_deref(), api_key.as_deref())?;
    tracing::info!(
        "Using provider '{}' with model '{}'",
        client.provider_name(),
        config.model
    );

    let tracker = tracker_from_config(&config.tracking, &output_dir);
    let aggregator = build_aggregator(config, client, tracker, Extractors::default())?;

    Ok(aggregator.run(&course, &output_dir).await)
}
