//! Per-lesson processing: extract every source, summarize each content group,
//! write one Markdown document.

use crate::association::LessonPlan;
use crate::describe::ImageDescriber;
use crate::extract::Extractors;
use crate::layout::{file_name, is_markup};
use crate::mapreduce::MapReduceSummarizer;
use crate::markdown::{lesson_file_name, render_lesson, LessonSection};
use crate::types::{CallContext, ContentKind, LessonOutcome, LessonStatus, SummaryStatus};
use coursebrief_core::AppResult;
use coursebrief_llm::LlmUsage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Lifecycle of one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStage {
    Pending,
    ExtractingPrimary,
    ExtractingSupplementary,
    Summarizing,
    Writing,
    Done,
    Skipped,
    Failed,
}

impl fmt::Display for LessonStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::ExtractingPrimary => "extracting-primary",
            Self::ExtractingSupplementary => "extracting-supplementary",
            Self::Summarizing => "summarizing",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Source text of one content group, before summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentGroup {
    pub kind: ContentKind,
    pub text: String,
}

/// Join the texts of several sources under `--- <file name> ---` headers.
fn combine_sources(sources: Vec<(String, String)>) -> String {
    sources
        .into_iter()
        .map(|(name, text)| format!("\n\n--- {} ---\n\n{}", name, text))
        .collect::<String>()
        .trim_start()
        .to_string()
}

/// Turns a [`LessonPlan`] into a lesson document.
pub struct LessonProcessor {
    extractors: Extractors,
    describer: Arc<dyn ImageDescriber>,
    summarizer: MapReduceSummarizer,
}

impl LessonProcessor {
    pub fn new(
        extractors: Extractors,
        describer: Arc<dyn ImageDescriber>,
        summarizer: MapReduceSummarizer,
    ) -> Self {
        Self {
            extractors,
            describer,
            summarizer,
        }
    }

    /// Where the document for `plan` is written inside `chapter_dir`.
    pub fn output_path(plan: &LessonPlan, chapter_dir: &Path) -> PathBuf {
        chapter_dir.join(lesson_file_name(&plan.title))
    }

    /// Process one lesson into `chapter_dir`.
    ///
    /// An existing document is left untouched. Extraction and service
    /// problems degrade the document instead of failing it; only a write
    /// failure yields [`LessonStatus::Failed`]. `Err` means misconfiguration.
    #[instrument(skip(self, plan, chapter_dir), fields(lesson = %plan.title))]
    pub async fn process(
        &self,
        plan: &LessonPlan,
        chapter: &str,
        chapter_dir: &Path,
    ) -> AppResult<LessonOutcome> {
        let mut stage = LessonStage::Pending;
        let output = Self::output_path(plan, chapter_dir);

        if output.exists() {
            transition(&mut stage, LessonStage::Skipped);
            tracing::info!("Summary already exists, skipping: {:?}", output);
            return Ok(LessonOutcome {
                title: plan.title.clone(),
                status: LessonStatus::Skipped,
                path: Some(output),
                tokens: 0,
            });
        }

        let ctx = CallContext::new(chapter, &plan.title, ContentKind::Primary);

        transition(&mut stage, LessonStage::ExtractingPrimary);
        let mut groups = Vec::with_capacity(ContentKind::ORDER.len());
        if let Some(text) = self.extract_primary(&plan.media) {
            groups.push(ContentGroup {
                kind: ContentKind::Primary,
                text,
            });
        }

        transition(&mut stage, LessonStage::ExtractingSupplementary);
        let (supplementary, image_tokens) = self.extract_supplementary(plan, &ctx).await;
        groups.extend(supplementary);

        transition(&mut stage, LessonStage::Summarizing);
        let mut sections = Vec::with_capacity(groups.len());
        let mut tokens = image_tokens;
        for group in &groups {
            tracing::info!(
                "Summarizing {} content of '{}' ({} characters)",
                group.kind,
                plan.title,
                group.text.len()
            );
            let outcome = self
                .summarizer
                .summarize_long(&group.text, &ctx.with_kind(group.kind))
                .await?;
            if let SummaryStatus::Degraded(reason) = &outcome.status {
                tracing::warn!("{} summary of '{}' degraded: {}", group.kind, plan.title, reason);
            }
            tokens += outcome.tokens();
            sections.push(LessonSection {
                kind: group.kind,
                text: outcome.text,
            });
        }

        if sections.is_empty() {
            tracing::warn!("No content could be extracted for lesson '{}'", plan.title);
        }

        transition(&mut stage, LessonStage::Writing);
        let document = render_lesson(&plan.title, &sections);
        match write_document(&output, &document) {
            Ok(()) => {
                transition(&mut stage, LessonStage::Done);
                tracing::info!("Wrote lesson summary {:?}", output);
                Ok(LessonOutcome {
                    title: plan.title.clone(),
                    status: LessonStatus::Done,
                    path: Some(output),
                    tokens,
                })
            }
            Err(e) => {
                transition(&mut stage, LessonStage::Failed);
                tracing::error!("Failed to write lesson summary {:?}: {}", output, e);
                Ok(LessonOutcome {
                    title: plan.title.clone(),
                    status: LessonStatus::Failed,
                    path: None,
                    tokens,
                })
            }
        }
    }

    fn extract_primary(&self, media: &Path) -> Option<String> {
        match self.extractors.transcript.extract(media) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!("Transcript of {:?}: {} characters", media, text.len());
                Some(text)
            }
            Ok(_) => {
                tracing::warn!("Transcript {:?} contains no text", media);
                None
            }
            Err(e) => {
                tracing::warn!("Skipping transcript {:?}: {}", media, e);
                None
            }
        }
    }

    /// Document, markup and orphan groups, in that order, empty ones dropped,
    /// plus the tokens spent describing images.
    async fn extract_supplementary(
        &self,
        plan: &LessonPlan,
        ctx: &CallContext,
    ) -> (Vec<ContentGroup>, u64) {
        let mut groups = Vec::new();
        let mut usages = Vec::new();

        let mut documents = Vec::new();
        for path in &plan.documents {
            push_source(&mut documents, path, self.extractors.document.extract(path));
        }

        let markup_ctx = ctx.with_kind(ContentKind::Markup);
        let mut markup = Vec::new();
        for path in &plan.markup {
            let text = self.extract_markup(path, &markup_ctx, &mut usages).await;
            push_source(&mut markup, path, text);
        }

        let orphan_ctx = ctx.with_kind(ContentKind::Supplementary);
        let mut orphans = Vec::new();
        for path in &plan.orphans {
            let text = if is_markup(path) {
                self.extract_markup(path, &orphan_ctx, &mut usages).await
            } else {
                self.extractors.document.extract(path)
            };
            push_source(&mut orphans, path, text);
        }

        for (kind, sources) in [
            (ContentKind::Document, documents),
            (ContentKind::Markup, markup),
            (ContentKind::Supplementary, orphans),
        ] {
            if !sources.is_empty() {
                groups.push(ContentGroup {
                    kind,
                    text: combine_sources(sources),
                });
            }
        }

        let image_tokens = LlmUsage::sum(usages).map_or(0, |u| u64::from(u.total_tokens));
        (groups, image_tokens)
    }

    /// Markup text followed by one description block per image.
    async fn extract_markup(
        &self,
        path: &Path,
        ctx: &CallContext,
        usages: &mut Vec<Option<LlmUsage>>,
    ) -> String {
        let content = self.extractors.markup.extract(path);
        let mut blocks = Vec::with_capacity(content.images.len() + 1);
        if !content.text.trim().is_empty() {
            blocks.push(content.text);
        }
        for image in &content.images {
            let description = self.describer.describe(image, ctx).await;
            usages.push(description.usage);
            blocks.push(description.text);
        }
        blocks.join("\n\n")
    }
}

fn push_source(sources: &mut Vec<(String, String)>, path: &Path, text: String) {
    if text.trim().is_empty() {
        tracing::debug!("No text extracted from {:?}", path);
    } else {
        sources.push((file_name(path), text));
    }
}

fn transition(stage: &mut LessonStage, next: LessonStage) {
    tracing::debug!("Lesson stage {} -> {}", stage, next);
    *stage = next;
}

fn write_document(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{LlmImageDescriber, NullImageDescriber};
    use coursebrief_prompt::{PromptKind, PromptLibrary};
    use crate::summarizer::tests::summarizer;
    use crate::tests::{FakeDocuments, FakeTranscripts};
    use crate::tracking::RecordingTracker;
    use coursebrief_core::config::SummarizationConfig;
    use coursebrief_llm::MockClient;
    use tempfile::TempDir;

    fn processor(
        client: Arc<MockClient>,
        tracker: Arc<RecordingTracker>,
        extractors: Extractors,
    ) -> LessonProcessor {
        LessonProcessor::new(
            extractors,
            Arc::new(NullImageDescriber),
            MapReduceSummarizer::new(summarizer(client, tracker), &SummarizationConfig::default()),
        )
    }

    fn plan(dir: &Path, title: &str) -> LessonPlan {
        LessonPlan {
            media: dir.join(format!("{}.vtt", title)),
            title: title.to_string(),
            key: None,
            documents: Vec::new(),
            markup: Vec::new(),
            orphans: Vec::new(),
        }
    }

    #[test]
    fn test_combine_sources() {
        let combined = combine_sources(vec![
            ("a.pdf".into(), "First".into()),
            ("b.txt".into(), "Second".into()),
        ]);
        assert_eq!(combined, "--- a.pdf ---\n\nFirst\n\n--- b.txt ---\n\nSecond");
    }

    #[tokio::test]
    async fn test_groups_in_order() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        let out = temp.path().join("out");
        let mut plan = plan(&source, "01_intro");
        plan.documents = vec![source.join("01_intro.pdf")];
        plan.orphans = vec![source.join("glossary.txt")];

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let extractors = Extractors {
            transcript: Arc::new(FakeTranscripts::default()),
            document: Arc::new(FakeDocuments::default()),
            ..Extractors::default()
        };

        let outcome = processor(client.clone(), tracker.clone(), extractors)
            .process(&plan, "01 Basics", &out)
            .await
            .unwrap();

        assert_eq!(outcome.status, LessonStatus::Done);
        assert_eq!(client.calls(), 3);
        let kinds: Vec<ContentKind> = tracker.calls().iter().map(|c| c.context.content_kind).collect();
        assert_eq!(
            kinds,
            [ContentKind::Primary, ContentKind::Document, ContentKind::Supplementary]
        );
        assert!(client.requests()[1].prompt.starts_with("--- 01_intro.pdf ---"));

        let path = outcome.path.unwrap();
        assert_eq!(path, out.join("01_intro_summary.md"));
        let doc = std::fs::read_to_string(path).unwrap();
        assert!(doc.contains("### Lesson Content"));
        assert!(doc.contains("### Additional Materials"));
        assert!(outcome.tokens > 0);
    }

    #[tokio::test]
    async fn test_missing_transcript_still_writes_document() {
        let temp = TempDir::new().unwrap();
        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());

        let outcome = processor(client.clone(), tracker, Extractors::default())
            .process(&plan(temp.path(), "01_gone"), "01 Basics", &temp.path().join("out"))
            .await
            .unwrap();

        assert_eq!(outcome.status, LessonStatus::Done);
        assert_eq!(client.calls(), 0);
        let doc = std::fs::read_to_string(outcome.path.unwrap()).unwrap();
        assert!(doc.contains("No summary available"));
    }

    #[tokio::test]
    async fn test_existing_document_is_skipped() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("01_intro_summary.md"), "old").unwrap();

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let extractors = Extractors {
            transcript: Arc::new(FakeTranscripts::default()),
            ..Extractors::default()
        };

        let outcome = processor(client.clone(), tracker, extractors)
            .process(&plan(temp.path(), "01_intro"), "01 Basics", &out)
            .await
            .unwrap();

        assert_eq!(outcome.status, LessonStatus::Skipped);
        assert_eq!(client.calls(), 0);
        assert_eq!(std::fs::read_to_string(out.join("01_intro_summary.md")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_write_failure_is_failed() {
        let temp = TempDir::new().unwrap();
        // A regular file where the chapter directory should be.
        let blocked = temp.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let extractors = Extractors {
            transcript: Arc::new(FakeTranscripts::default()),
            ..Extractors::default()
        };

        let outcome = processor(client, tracker, extractors)
            .process(&plan(temp.path(), "01_intro"), "01 Basics", &blocked)
            .await
            .unwrap();

        assert_eq!(outcome.status, LessonStatus::Failed);
        assert!(outcome.path.is_none());
        assert!(!outcome.has_document());
    }

    #[tokio::test]
    async fn test_image_description_tokens_are_counted() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(
            source.join("01_intro.html"),
            r#"<html><body><p>Borrowing rules.</p><img src="https://cdn.example.com/borrow.png" alt="Borrow diagram"></body></html>"#,
        )
        .unwrap();
        let mut plan = plan(&source, "01_intro");
        plan.markup = vec![source.join("01_intro.html")];

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let describer = LlmImageDescriber::new(
            client.clone(),
            Arc::new(PromptLibrary::builtin().unwrap()),
            tracker.clone(),
            "gpt-4o",
        );
        let processor = LessonProcessor::new(
            Extractors {
                transcript: Arc::new(FakeTranscripts::default()),
                ..Extractors::default()
            },
            Arc::new(describer),
            MapReduceSummarizer::new(
                summarizer(client.clone(), tracker.clone()),
                &SummarizationConfig::default(),
            ),
        );

        let outcome = processor
            .process(&plan, "01 Basics", &temp.path().join("out"))
            .await
            .unwrap();

        let calls = tracker.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].prompt_kind, PromptKind::Image);
        let tracked: u64 = calls
            .iter()
            .filter_map(|c| c.usage.map(|u| u64::from(u.total_tokens)))
            .sum();
        assert!(calls[0].usage.is_some_and(|u| u.total_tokens > 0));
        assert_eq!(outcome.tokens, tracked);
    }
}
