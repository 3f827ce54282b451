//! Run statistics accumulated by value.

use crate::types::{LessonOutcome, LessonStatus};
use serde::Serialize;
use std::ops::AddAssign;

/// Counters for one processing call.
///
/// Every level of the pipeline returns its own `RunStats` and the caller
/// merges them; nothing is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub lessons_processed: u32,
    pub lessons_skipped: u32,
    pub lessons_failed: u32,
    pub chapters_written: u32,
    pub tokens: u64,
}

impl RunStats {
    /// Stats for a single lesson outcome.
    pub fn from_lesson(outcome: &LessonOutcome) -> Self {
        let mut stats = Self {
            tokens: outcome.tokens,
            ..Self::default()
        };
        match outcome.status {
            LessonStatus::Done => stats.lessons_processed = 1,
            LessonStatus::Skipped => stats.lessons_skipped = 1,
            LessonStatus::Failed => stats.lessons_failed = 1,
        }
        stats
    }

    pub fn merge(mut self, other: RunStats) -> Self {
        self += other;
        self
    }

    pub fn lessons_total(&self) -> u32 {
        self.lessons_processed + self.lessons_skipped + self.lessons_failed
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, rhs: Self) {
        self.lessons_processed += rhs.lessons_processed;
        self.lessons_skipped += rhs.lessons_skipped;
        self.lessons_failed += rhs.lessons_failed;
        self.chapters_written += rhs.chapters_written;
        self.tokens += rhs.tokens;
    }
}
