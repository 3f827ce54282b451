//! Observability of service calls and run metrics.
//!
//! A [`Tracker`] receives one [`CallRecord`] per attempt and one
//! [`RunMetrics`] at the end of a run. Implementations may fail; callers log
//! the failure and carry on, so tracking never affects the pipeline.

use crate::types::CallContext;
use chrono::{DateTime, Utc};
use coursebrief_core::config::{TrackingConfig, TrackingSink};
use coursebrief_core::AppResult;
use coursebrief_llm::LlmUsage;
use coursebrief_prompt::PromptKind;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Outcome class of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    /// The call succeeded but produced nothing usable
    Degraded,
    Failed,
}

/// One attempt against the generation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    #[serde(flatten)]
    pub context: CallContext,
    pub prompt_kind: PromptKind,
    pub attempt: u32,
    pub model: String,
    pub input: String,
    pub output: Option<String>,
    pub usage: Option<LlmUsage>,
    pub latency_ms: u64,
    pub status: CallStatus,
    /// Failure tag (`connectivity`, `rate_limit`, `status`, `unexpected`, `empty`)
    pub error: Option<String>,
}

/// Totals reported once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    pub lessons_processed: u32,
    pub lessons_failed: u32,
    pub lessons_skipped: u32,
    pub tokens: u64,
    pub elapsed_secs: f64,
}

/// Sink for call records and run metrics.
pub trait Tracker: Send + Sync {
    fn record_call(&self, record: &CallRecord) -> AppResult<()>;

    fn record_metrics(&self, metrics: &RunMetrics) -> AppResult<()>;
}

/// Report a call, logging instead of propagating tracker failures.
pub fn report_call(tracker: &dyn Tracker, record: &CallRecord) {
    if let Err(e) = tracker.record_call(record) {
        tracing::warn!("Failed to record service call: {}", e);
    }
}

/// Report run metrics, logging instead of propagating tracker failures.
pub fn report_metrics(tracker: &dyn Tracker, metrics: &RunMetrics) {
    if let Err(e) = tracker.record_metrics(metrics) {
        tracing::warn!("Failed to record run metrics: {}", e);
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracker;

impl Tracker for NullTracker {
    fn record_call(&self, _record: &CallRecord) -> AppResult<()> {
        Ok(())
    }

    fn record_metrics(&self, _metrics: &RunMetrics) -> AppResult<()> {
        Ok(())
    }
}

/// Emits records as tracing events under the `coursebrief::tracking` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn record_call(&self, record: &CallRecord) -> AppResult<()> {
        tracing::debug!(
            target: "coursebrief::tracking",
            chapter = %record.context.chapter,
            lesson = %record.context.lesson,
            content = %record.context.content_kind,
            prompt = %record.prompt_kind,
            attempt = record.attempt,
            model = %record.model,
            input_chars = record.input.len(),
            output_chars = record.output.as_ref().map(|o| o.len()).unwrap_or(0),
            tokens = record.usage.map(|u| u.total_tokens).unwrap_or(0),
            latency_ms = record.latency_ms,
            status = ?record.status,
            error = record.error.as_deref().unwrap_or(""),
            "service call"
        );
        Ok(())
    }

    fn record_metrics(&self, metrics: &RunMetrics) -> AppResult<()> {
        tracing::info!(
            target: "coursebrief::tracking",
            processed = metrics.lessons_processed,
            failed = metrics.lessons_failed,
            skipped = metrics.lessons_skipped,
            tokens = metrics.tokens,
            elapsed_secs = metrics.elapsed_secs,
            "run metrics"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonlEvent<'a, T: Serialize> {
    session_id: &'a str,
    timestamp: DateTime<Utc>,
    event: &'static str,
    #[serde(flatten)]
    payload: &'a T,
}

/// Appends one JSON object per line to a file, tagged with a per-run session id.
#[derive(Debug)]
pub struct JsonlTracker {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl JsonlTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn append<T: Serialize>(&self, event: &'static str, payload: &T) -> AppResult<()> {
        let line = serde_json::to_string(&JsonlEvent {
            session_id: &self.session_id,
            timestamp: Utc::now(),
            event,
            payload,
        })?;

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl Tracker for JsonlTracker {
    fn record_call(&self, record: &CallRecord) -> AppResult<()> {
        self.append("call", record)
    }

    fn record_metrics(&self, metrics: &RunMetrics) -> AppResult<()> {
        self.append("metrics", metrics)
    }
}

/// Build the tracker selected by configuration.
///
/// The JSON Lines file defaults to `<output_dir>/.coursebrief/events.jsonl`.
pub fn tracker_from_config(config: &TrackingConfig, output_dir: &Path) -> Arc<dyn Tracker> {
    match config.sink {
        TrackingSink::None => Arc::new(NullTracker),
        TrackingSink::Log => Arc::new(LogTracker),
        TrackingSink::Jsonl => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| output_dir.join(".coursebrief").join("events.jsonl"));
            let tracker = JsonlTracker::new(path);
            tracing::info!(
                "Tracking to {:?} (session {})",
                tracker.path(),
                tracker.session_id()
            );
            Arc::new(tracker)
        }
    }
}

/// Collects records in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingTracker {
    pub calls: Mutex<Vec<CallRecord>>,
    pub metrics: Mutex<Vec<RunMetrics>>,
}

#[cfg(test)]
impl RecordingTracker {
    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn failed_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.status == CallStatus::Failed)
            .count()
    }
}

#[cfg(test)]
impl Tracker for RecordingTracker {
    fn record_call(&self, record: &CallRecord) -> AppResult<()> {
        self.calls.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn record_metrics(&self, metrics: &RunMetrics) -> AppResult<()> {
        self.metrics.lock().unwrap().push(*metrics);
        Ok(())
    }
}
