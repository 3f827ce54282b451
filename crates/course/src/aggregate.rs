//! Course-level driver: chapters, lessons, chapter documents and the index.

use crate::association::associate;
use crate::layout::{ChapterLayout, CourseLayout};
use crate::lesson::LessonProcessor;
use crate::markdown::{
    chapter_file_name, render_chapter, render_index, ChapterLink, LessonLink, INDEX_FILE_NAME,
};
use crate::ordering::OrderingKeyPolicy;
use crate::stats::RunStats;
use crate::tracking::{report_metrics, RunMetrics, Tracker};
use crate::types::{LessonOutcome, LessonStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// What happened to one chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub name: String,
    pub lessons: Vec<LessonOutcome>,
    /// Chapter document, absent when no lesson has a document or writing failed
    pub document: Option<PathBuf>,
    pub stats: RunStats,
}

/// What happened to a whole course.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub course: String,
    pub output_dir: PathBuf,
    pub chapters: Vec<ChapterReport>,
    /// Course index, absent only when writing it failed
    pub index: Option<PathBuf>,
    pub stats: RunStats,
    pub elapsed: Duration,
}

/// Processes a course one chapter and one lesson at a time.
pub struct CourseAggregator {
    processor: LessonProcessor,
    policy: Arc<dyn OrderingKeyPolicy>,
    tracker: Arc<dyn Tracker>,
}

impl CourseAggregator {
    pub fn new(
        processor: LessonProcessor,
        policy: Arc<dyn OrderingKeyPolicy>,
        tracker: Arc<dyn Tracker>,
    ) -> Self {
        Self {
            processor,
            policy,
            tracker,
        }
    }

    /// Summarize every chapter of `course` into `output_dir`.
    ///
    /// Problems are contained in the lesson or document they affect; the
    /// index and run metrics are always produced.
    pub async fn run(&self, course: &CourseLayout, output_dir: &Path) -> RunReport {
        let started = Instant::now();
        tracing::info!(
            "Summarizing course '{}' ({} chapters) into {:?}",
            course.name,
            course.chapters.len(),
            output_dir
        );

        let mut chapters = Vec::with_capacity(course.chapters.len());
        let mut stats = RunStats::default();

        for chapter in &course.chapters {
            let span = tracing::info_span!("chapter", name = %chapter.name);
            let report = self
                .process_chapter(chapter, output_dir)
                .instrument(span)
                .await;
            stats += report.stats;
            chapters.push(report);
        }

        let links: Vec<ChapterLink> = chapters
            .iter()
            .filter(|c| c.document.is_some())
            .map(|c| ChapterLink {
                chapter: c.name.clone(),
                file_name: chapter_file_name(&c.name),
            })
            .collect();
        if links.is_empty() {
            tracing::warn!("No chapter summaries were produced for '{}'", course.name);
        }

        let index_path = output_dir.join(INDEX_FILE_NAME);
        let index = write_or_log(&index_path, &render_index(&course.name, &links));

        let elapsed = started.elapsed();
        report_metrics(
            self.tracker.as_ref(),
            &RunMetrics {
                lessons_processed: stats.lessons_processed,
                lessons_failed: stats.lessons_failed,
                lessons_skipped: stats.lessons_skipped,
                tokens: stats.tokens,
                elapsed_secs: elapsed.as_secs_f64(),
            },
        );

        tracing::info!(
            "Course '{}' done: {} processed, {} skipped, {} failed, {} tokens in {:.1}s",
            course.name,
            stats.lessons_processed,
            stats.lessons_skipped,
            stats.lessons_failed,
            stats.tokens,
            elapsed.as_secs_f64()
        );

        RunReport {
            course: course.name.clone(),
            output_dir: output_dir.to_path_buf(),
            chapters,
            index,
            stats,
            elapsed,
        }
    }

    /// Process every lesson of one chapter, then write its chapter document.
    pub async fn process_chapter(
        &self,
        chapter: &ChapterLayout,
        output_dir: &Path,
    ) -> ChapterReport {
        let plans = associate(chapter, self.policy.as_ref());
        let chapter_dir = output_dir.join(&chapter.name);
        tracing::info!("Chapter '{}': {} lessons", chapter.name, plans.len());

        let mut lessons = Vec::with_capacity(plans.len());
        let mut stats = RunStats::default();

        for plan in &plans {
            let outcome = match self.processor.process(plan, &chapter.name, &chapter_dir).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Lesson '{}' aborted: {}", plan.title, e);
                    LessonOutcome {
                        title: plan.title.clone(),
                        status: LessonStatus::Failed,
                        path: None,
                        tokens: 0,
                    }
                }
            };
            stats += RunStats::from_lesson(&outcome);
            lessons.push(outcome);
        }

        let links: Vec<LessonLink> = lessons
            .iter()
            .filter(|l| l.has_document())
            .filter_map(|l| l.path.as_deref())
            .map(|p| LessonLink {
                file_name: crate::layout::file_name(p),
            })
            .collect();

        let document = if links.is_empty() {
            tracing::warn!("No lesson summaries for chapter '{}', skipping chapter document", chapter.name);
            None
        } else {
            let path = chapter_dir.join(chapter_file_name(&chapter.name));
            write_or_log(&path, &render_chapter(&chapter.name, &links))
        };

        if document.is_some() {
            stats.chapters_written += 1;
        }

        ChapterReport {
            name: chapter.name.clone(),
            lessons,
            document,
            stats,
        }
    }
}

/// Write a document, logging failures and returning its path on success.
fn write_or_log(path: &Path, contents: &str) -> Option<PathBuf> {
    let result = path
        .parent()
        .map(std::fs::create_dir_all)
        .unwrap_or(Ok(()))
        .and_then(|()| std::fs::write(path, contents));

    match result {
        Ok(()) => {
            tracing::info!("Wrote {:?}", path);
            Some(path.to_path_buf())
        }
        Err(e) => {
            tracing::error!("Failed to write {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::NullImageDescriber;
    use crate::extract::Extractors;
    use crate::mapreduce::MapReduceSummarizer;
    use crate::ordering::DigitPrefixPolicy;
    use crate::summarizer::tests::summarizer;
    use crate::tests::FakeTranscripts;
    use crate::tracking::RecordingTracker;
    use coursebrief_core::config::SummarizationConfig;
    use coursebrief_llm::MockClient;
    use std::fs;
    use tempfile::TempDir;

    fn aggregator(client: Arc<MockClient>, tracker: Arc<RecordingTracker>) -> CourseAggregator {
        let processor = LessonProcessor::new(
            Extractors {
                transcript: Arc::new(FakeTranscripts::default()),
                ..Extractors::default()
            },
            Arc::new(NullImageDescriber),
            MapReduceSummarizer::new(
                summarizer(client, tracker.clone()),
                &SummarizationConfig::default(),
            ),
        );
        CourseAggregator::new(processor, Arc::new(DigitPrefixPolicy), tracker)
    }

    #[tokio::test]
    async fn test_empty_chapter_gets_no_document() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("course");
        fs::create_dir_all(root.join("01 Basics")).unwrap();
        fs::create_dir_all(root.join("02 Empty")).unwrap();
        fs::write(root.join("01 Basics/01_intro.vtt"), "").unwrap();
        fs::write(root.join("02 Empty/notes.txt"), "loose").unwrap();
        let out = temp.path().join("out");

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let course = CourseLayout::scan(&root).unwrap();
        let report = aggregator(client, tracker.clone()).run(&course, &out).await;

        assert!(report.chapters[0].document.is_some());
        assert!(report.chapters[1].document.is_none());
        assert!(!out.join("02 Empty").exists());
        assert_eq!(report.stats.chapters_written, 1);

        let index = fs::read_to_string(out.join("index.md")).unwrap();
        assert!(index.contains("Chapter: 01 Basics"));
        assert!(!index.contains("02 Empty"));

        let metrics = tracker.metrics.lock().unwrap().clone();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].lessons_processed, 1);
    }

    #[tokio::test]
    async fn test_empty_course_still_has_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("course");
        fs::create_dir_all(&root).unwrap();
        let out = temp.path().join("out");

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let course = CourseLayout::scan(&root).unwrap();
        let report = aggregator(client.clone(), tracker).run(&course, &out).await;

        assert_eq!(report.index, Some(out.join("index.md")));
        assert!(fs::read_to_string(out.join("index.md"))
            .unwrap()
            .contains("No chapter summaries"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_lessons_are_not_linked() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("course");
        fs::create_dir_all(root.join("01 Basics")).unwrap();
        fs::write(root.join("01 Basics/01_intro.vtt"), "").unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        // The chapter output directory cannot be created.
        fs::write(out.join("01 Basics"), "").unwrap();

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let course = CourseLayout::scan(&root).unwrap();
        let report = aggregator(client, tracker).run(&course, &out).await;

        assert_eq!(report.stats.lessons_failed, 1);
        assert!(report.chapters[0].document.is_none());
        assert!(report.index.is_some());
    }

    #[tokio::test]
    async fn test_media_sharing_a_stem_is_written_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("course");
        fs::create_dir_all(root.join("01 Basics")).unwrap();
        fs::write(root.join("01 Basics/01_intro.vtt"), "").unwrap();
        fs::write(root.join("01 Basics/01_intro.srt"), "").unwrap();
        let out = temp.path().join("out");

        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let course = CourseLayout::scan(&root).unwrap();
        let report = aggregator(client.clone(), tracker).run(&course, &out).await;

        let lessons = &report.chapters[0].lessons;
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].status, LessonStatus::Done);
        assert_eq!(client.calls(), 1);

        let chapter = fs::read_to_string(out.join("01 Basics/_CHAPTER_SUMMARY_01 Basics.md")).unwrap();
        assert_eq!(chapter.matches("01_intro_summary.md").count(), 1);
    }

    #[tokio::test]
    async fn test_lesson_error_does_not_stop_the_run() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("course");
        fs::create_dir_all(root.join("01 Basics")).unwrap();
        fs::write(root.join("01 Basics/01_intro.vtt"), "").unwrap();
        let out = temp.path().join("out");

        // Any transcript is over budget, and chunking rejects the overlap.
        let settings = SummarizationConfig {
            token_budget: 1,
            chunk_size: 100,
            chunk_overlap: 200,
            retry_delay_ms: 0,
        };
        let client = Arc::new(MockClient::new());
        let tracker = Arc::new(RecordingTracker::default());
        let processor = LessonProcessor::new(
            Extractors {
                transcript: Arc::new(FakeTranscripts::default()),
                ..Extractors::default()
            },
            Arc::new(NullImageDescriber),
            MapReduceSummarizer::new(summarizer(client.clone(), tracker.clone()), &settings),
        );
        let aggregator = CourseAggregator::new(processor, Arc::new(DigitPrefixPolicy), tracker.clone());

        let course = CourseLayout::scan(&root).unwrap();
        let report = aggregator.run(&course, &out).await;

        assert_eq!(report.stats.lessons_failed, 1);
        assert_eq!(report.chapters[0].lessons[0].status, LessonStatus::Failed);
        assert!(report.chapters[0].document.is_none());
        assert!(out.join("index.md").exists());
        assert_eq!(tracker.metrics.lock().unwrap()[0].lessons_failed, 1);
        assert_eq!(client.calls(), 0);
    }
}
