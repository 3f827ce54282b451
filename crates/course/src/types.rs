//! Core types shared across the summarization pipeline.

use coursebrief_llm::LlmUsage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Class of source text assembled for one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Transcript of the lesson media file
    Primary,
    /// Fixed documents owned by the lesson (PDF, text)
    Document,
    /// Structured markup owned by the lesson (HTML)
    Markup,
    /// Orphans attached by name order
    Supplementary,
}

impl ContentKind {
    /// Order in which groups appear in a lesson document.
    pub const ORDER: [ContentKind; 4] = [
        Self::Primary,
        Self::Document,
        Self::Markup,
        Self::Supplementary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Document => "document",
            Self::Markup => "markup",
            Self::Supplementary => "supplementary",
        }
    }

    /// Section heading used in the lesson document.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Primary => "Lesson Content",
            Self::Document => "Insights from Course Documents",
            Self::Markup => "Insights from Web Materials",
            Self::Supplementary => "Additional Materials",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result class of a summarization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum SummaryStatus {
    Success,
    Degraded(String),
}

impl SummaryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Text produced for one summarization request.
///
/// A degraded outcome still carries displayable text (a notice or an error
/// string) so the caller can always write something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub text: String,
    pub usage: Option<LlmUsage>,
    pub status: SummaryStatus,
}

impl SummaryOutcome {
    pub fn success(text: impl Into<String>, usage: Option<LlmUsage>) -> Self {
        Self {
            text: text.into(),
            usage,
            status: SummaryStatus::Success,
        }
    }

    pub fn degraded(
        text: impl Into<String>,
        usage: Option<LlmUsage>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            usage,
            status: SummaryStatus::Degraded(reason.into()),
        }
    }

    /// Total tokens reported for this outcome, zero when unknown.
    pub fn tokens(&self) -> u64 {
        self.usage.map(|u| u64::from(u.total_tokens)).unwrap_or(0)
    }
}

/// Identifies the unit of work a service call belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallContext {
    pub chapter: String,
    pub lesson: String,
    pub content_kind: ContentKind,
}

impl CallContext {
    pub fn new(
        chapter: impl Into<String>,
        lesson: impl Into<String>,
        content_kind: ContentKind,
    ) -> Self {
        Self {
            chapter: chapter.into(),
            lesson: lesson.into(),
            content_kind,
        }
    }

    pub fn with_kind(&self, content_kind: ContentKind) -> Self {
        Self {
            content_kind,
            ..self.clone()
        }
    }
}

/// Terminal state of one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    /// A new document was written
    Done,
    /// The document already existed
    Skipped,
    /// The document could not be written
    Failed,
}

/// What happened to one lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOutcome {
    pub title: String,
    pub status: LessonStatus,
    /// Document path, present for `Done` and `Skipped`
    pub path: Option<PathBuf>,
    pub tokens: u64,
}

impl LessonOutcome {
    pub fn has_document(&self) -> bool {
        self.path.is_some() && self.status != LessonStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_status_serialization() {
        let json = serde_json::to_value(SummaryStatus::Degraded("empty input".into())).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["reason"], "empty input");

        let json = serde_json::to_value(SummaryStatus::Success).unwrap();
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn test_outcome_tokens() {
        let outcome = SummaryOutcome::success("text", Some(LlmUsage::new(10, 5)));
        assert_eq!(outcome.tokens(), 15);
        assert_eq!(SummaryOutcome::degraded("x", None, "r").tokens(), 0);
    }

    #[test]
    fn test_content_kind_order() {
        let names: Vec<_> = ContentKind::ORDER.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["primary", "document", "markup", "supplementary"]);
    }
}
