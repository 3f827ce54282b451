//! Map-reduce summarization of arbitrarily long text.

use crate::chunker;
use crate::summarizer::Summarizer;
use crate::types::{CallContext, SummaryOutcome, SummaryStatus};
use coursebrief_core::config::SummarizationConfig;
use coursebrief_core::AppResult;
use coursebrief_llm::LlmUsage;
use coursebrief_prompt::PromptKind;

/// Separator placed between chunk summaries before the reduce step.
pub const CHUNK_SEPARATOR: &str = "\n\n---===NEXT CHUNK SUMMARY===---\n\n";

/// Rough token estimate: three characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 3
}

/// Summarizes text of any length.
///
/// Text well inside the token budget goes out in one request. Longer text is
/// chunked, each chunk is explained on its own, and the explanations are
/// synthesized into one account.
pub struct MapReduceSummarizer {
    summarizer: Summarizer,
    token_budget: usize,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl MapReduceSummarizer {
    pub fn new(summarizer: Summarizer, config: &SummarizationConfig) -> Self {
        Self {
            summarizer,
            token_budget: config.token_budget,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Whether `text` fits in a single request (under 75% of the budget).
    pub fn fits_single_request(&self, text: &str) -> bool {
        estimate_tokens(text) * 4 < self.token_budget * 3
    }

    pub async fn summarize_long(&self, text: &str, ctx: &CallContext) -> AppResult<SummaryOutcome> {
        if self.fits_single_request(text) {
            tracing::debug!(
                "'{}' {} text fits one request (~{} tokens)",
                ctx.lesson,
                ctx.content_kind,
                estimate_tokens(text)
            );
            return self.summarizer.summarize(text, PromptKind::Lesson, ctx).await;
        }

        let chunks = chunker::chunk(text, self.chunk_size, self.chunk_overlap)?;
        match chunks.len() {
            0 => return self.summarizer.summarize("", PromptKind::Lesson, ctx).await,
            1 => {
                tracing::debug!("'{}' text is a single chunk, summarizing directly", ctx.lesson);
                return self
                    .summarizer
                    .summarize(&chunks[0], PromptKind::Lesson, ctx)
                    .await;
            }
            _ => {}
        }

        let total = chunks.len();
        tracing::info!(
            "Summarizing '{}' {} text in {} chunks",
            ctx.lesson,
            ctx.content_kind,
            total
        );

        let mut partials = Vec::with_capacity(total);
        let mut usages = Vec::with_capacity(total + 1);
        let mut degraded = 0usize;

        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Summarizing chunk {}/{}", i + 1, total);
            let outcome = self.summarizer.summarize(chunk, PromptKind::Chunk, ctx).await?;
            usages.push(outcome.usage);

            if outcome.status.is_success() {
                partials.push(outcome.text);
            } else {
                degraded += 1;
                partials.push(format!("[Error summarizing chunk {}/{}]", i + 1, total));
            }
        }

        if degraded > 0 {
            tracing::warn!(
                "{} of {} chunks of '{}' could not be summarized",
                degraded,
                total,
                ctx.lesson
            );
        }

        let combined = partials.join(CHUNK_SEPARATOR);
        tracing::debug!("Synthesizing {} chunk summaries ({} characters)", total, combined.len());

        let reduced = self
            .summarizer
            .summarize(&combined, PromptKind::Synthesis, ctx)
            .await?;
        usages.push(reduced.usage);

        let status = if degraded > 0 && reduced.status.is_success() {
            SummaryStatus::Degraded(format!("{} of {} chunks failed", degraded, total))
        } else {
            reduced.status
        };

        Ok(SummaryOutcome {
            text: reduced.text,
            usage: LlmUsage::sum(usages),
            status,
        })
    }
}
