//! Resilient single-request summarization.
//!
//! Every request is attempted up to [`MAX_ATTEMPTS`] times with a fixed
//! delay in between. All service failure kinds are retried alike. When the
//! attempts run out the caller still gets text: a degraded outcome carrying
//! the last error.

use crate::tracking::{report_call, CallRecord, CallStatus, Tracker};
use crate::types::{CallContext, SummaryOutcome};
use coursebrief_core::AppResult;
use coursebrief_llm::{LlmClient, LlmRequest, LlmResponse};
use coursebrief_prompt::{PromptKind, PromptLibrary};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

/// Calls made for one request before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Text returned for whitespace-only input.
pub const EMPTY_INPUT_NOTICE: &str = "No content was provided for this summary.";

/// Text returned when the service answers with an empty body.
pub const EMPTY_GENERATION_NOTICE: &str = "The generation service returned an empty summary.";

/// Model and sampling settings for summary requests.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    pub model: String,
    pub temperature: f32,
    pub retry_delay: Duration,
}

/// Summarization client with retry, backoff and call tracking.
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    tracker: Arc<dyn Tracker>,
    settings: SummarizerSettings,
}

impl Summarizer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        tracker: Arc<dyn Tracker>,
        settings: SummarizerSettings,
    ) -> Self {
        Self {
            client,
            prompts,
            tracker,
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Summarize `text` with the prompt for `kind`.
    ///
    /// Returns `Err` only for configuration problems (a prompt that cannot
    /// be rendered). Service failures come back as degraded outcomes.
    pub async fn summarize(
        &self,
        text: &str,
        kind: PromptKind,
        ctx: &CallContext,
    ) -> AppResult<SummaryOutcome> {
        if text.trim().is_empty() {
            tracing::warn!(
                "Empty input for {} summary of '{}', skipping service call",
                kind,
                ctx.lesson
            );
            return Ok(SummaryOutcome::degraded(EMPTY_INPUT_NOTICE, None, "empty input"));
        }

        let built = self.prompts.build(kind, text)?;
        let mut request = LlmRequest::new(built.user, &self.settings.model)
            .with_temperature(self.settings.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = built.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let attempts = AtomicU32::new(0);
        let strategy = FixedInterval::new(self.settings.retry_delay).take(MAX_ATTEMPTS as usize - 1);
        let result = Retry::spawn(strategy, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.attempt(&request, kind, ctx, attempt)
        })
        .await;

        match result {
            Ok((response, mut record)) => {
                let content = response.content.trim().to_string();

                if content.is_empty() {
                    tracing::warn!(
                        "Service returned an empty {} summary for '{}'",
                        kind,
                        ctx.lesson
                    );
                    record.status = CallStatus::Degraded;
                    record.error = Some("empty".to_string());
                    report_call(self.tracker.as_ref(), &record);
                    return Ok(SummaryOutcome::degraded(
                        EMPTY_GENERATION_NOTICE,
                        response.usage,
                        "empty generation",
                    ));
                }

                tracing::debug!(
                    "{} summary for '{}' generated on attempt {} ({} characters)",
                    kind,
                    ctx.lesson,
                    record.attempt,
                    content.len()
                );
                record.output = Some(content.clone());
                report_call(self.tracker.as_ref(), &record);
                Ok(SummaryOutcome::success(content, response.usage))
            }
            Err(e) => {
                tracing::error!(
                    "Giving up on {} summary of '{}' after {} attempts",
                    kind,
                    ctx.lesson,
                    MAX_ATTEMPTS
                );
                Ok(SummaryOutcome::degraded(
                    format!("[Summary unavailable after {} attempts: {}]", MAX_ATTEMPTS, e),
                    None,
                    "retries exhausted",
                ))
            }
        }
    }

    /// One service call. Failures are reported here, successes by the caller
    /// once the output is known.
    async fn attempt(
        &self,
        request: &LlmRequest,
        kind: PromptKind,
        ctx: &CallContext,
        attempt: u32,
    ) -> AppResult<(LlmResponse, CallRecord)> {
        let started = Instant::now();
        let result = self.client.complete(request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut record = CallRecord {
            context: ctx.clone(),
            prompt_kind: kind,
            attempt,
            model: self.settings.model.clone(),
            input: request.prompt.clone(),
            output: None,
            usage: None,
            latency_ms,
            status: CallStatus::Success,
            error: None,
        };

        match result {
            Ok(response) => {
                record.usage = response.usage;
                Ok((response, record))
            }
            Err(e) => {
                let tag = e.service_kind().map(|k| k.as_tag()).unwrap_or("unexpected");
                tracing::warn!(
                    "Attempt {}/{} for {} summary of '{}' failed: {}",
                    attempt,
                    MAX_ATTEMPTS,
                    kind,
                    ctx.lesson,
                    e
                );
                record.status = CallStatus::Failed;
                record.error = Some(tag.to_string());
                report_call(self.tracker.as_ref(), &record);
                Err(e)
            }
        }
    }
}
