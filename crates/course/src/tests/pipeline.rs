//! End-to-end runs over temporary course trees.

use super::{FakeDocuments, FakeTranscripts};
use crate::extract::Extractors;
use crate::layout::CourseLayout;
use crate::tracking::RecordingTracker;
use crate::types::{ContentKind, LessonStatus};
use crate::{build_aggregator, plan_course, DigitPrefixPolicy};
use coursebrief_core::AppConfig;
use coursebrief_llm::MockClient;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.provider = "mock".to_string();
    config.summarization.retry_delay_ms = 0;
    config
}

fn fake_extractors() -> Extractors {
    Extractors {
        transcript: Arc::new(FakeTranscripts),
        document: Arc::new(FakeDocuments),
        ..Extractors::default()
    }
}

fn basic_course(root: &Path) {
    let chapter = root.join("01 Basics");
    fs::create_dir_all(&chapter).unwrap();
    fs::write(chapter.join("01_intro.vtt"), "").unwrap();
    fs::write(chapter.join("01_intro.pdf"), "").unwrap();
}

#[tokio::test]
async fn test_end_to_end_single_lesson() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Rust Course");
    basic_course(&root);
    let out = temp.path().join("out");

    let client = Arc::new(MockClient::new());
    let tracker = Arc::new(RecordingTracker::default());
    let aggregator =
        build_aggregator(&config(), client.clone(), tracker.clone(), fake_extractors()).unwrap();

    let course = CourseLayout::scan(&root).unwrap();
    let report = aggregator.run(&course, &out).await;

    assert_eq!(client.calls(), 2);
    assert_eq!(report.stats.lessons_processed, 1);
    assert_eq!(report.stats.chapters_written, 1);

    let lesson = fs::read_to_string(out.join("01 Basics/01_intro_summary.md")).unwrap();
    assert!(lesson.starts_with("## 01_intro\n"));
    assert!(lesson.contains("### Lesson Content\n\nmock summary #1"));
    assert!(lesson.contains("### Insights from Course Documents\n\nmock summary #2"));
    assert!(!lesson.contains("### Insights from Web Materials"));

    let chapter =
        fs::read_to_string(out.join("01 Basics/_CHAPTER_SUMMARY_01 Basics.md")).unwrap();
    assert!(chapter.contains("- [01_intro](01_intro_summary.md)"));

    let index = fs::read_to_string(out.join("index.md")).unwrap();
    assert!(index.contains("# Course Index: Rust Course"));
    assert!(index.contains("- [Chapter: 01 Basics](<01 Basics/_CHAPTER_SUMMARY_01 Basics.md>)"));

    let kinds: Vec<ContentKind> = tracker
        .calls()
        .iter()
        .map(|c| c.context.content_kind)
        .collect();
    assert_eq!(kinds, [ContentKind::Primary, ContentKind::Document]);
    assert!(tracker.calls().iter().all(|c| c.context.chapter == "01 Basics"));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Rust Course");
    basic_course(&root);
    let out = temp.path().join("out");
    let course = CourseLayout::scan(&root).unwrap();

    let first = Arc::new(MockClient::new());
    build_aggregator(&config(), first.clone(), Arc::new(RecordingTracker::default()), fake_extractors())
        .unwrap()
        .run(&course, &out)
        .await;
    let lesson_path = out.join("01 Basics/01_intro_summary.md");
    let before = fs::read_to_string(&lesson_path).unwrap();

    let second = Arc::new(MockClient::new());
    let report = build_aggregator(&config(), second.clone(), Arc::new(RecordingTracker::default()), fake_extractors())
        .unwrap()
        .run(&course, &out)
        .await;

    assert_eq!(second.calls(), 0);
    assert_eq!(report.stats.lessons_skipped, 1);
    assert_eq!(report.chapters[0].lessons[0].status, LessonStatus::Skipped);
    assert_eq!(fs::read_to_string(&lesson_path).unwrap(), before);
    // Skipped lessons are still linked.
    assert!(report.chapters[0].document.is_some());
}

#[tokio::test]
async fn test_real_extractors_with_markup_and_orphan() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("course");
    let chapter = root.join("01 Basics");
    fs::create_dir_all(&chapter).unwrap();
    fs::write(
        chapter.join("01_intro.vtt"),
        "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nWelcome to the course.\n\n00:00:02.000 --> 00:00:04.000\nToday we cover <b>ownership</b>.\n",
    )
    .unwrap();
    fs::write(
        chapter.join("01_intro.html"),
        r#"<html><body><p>Borrowing rules.</p><img src="borrow.png" alt="Borrow diagram"></body></html>"#,
    )
    .unwrap();
    fs::write(chapter.join("glossary.txt"), "Lifetime: how long a reference is valid.").unwrap();
    let out = temp.path().join("out");

    let client = Arc::new(MockClient::new());
    let tracker = Arc::new(RecordingTracker::default());
    let aggregator =
        build_aggregator(&config(), client.clone(), tracker.clone(), Extractors::default()).unwrap();

    let course = CourseLayout::scan(&root).unwrap();
    aggregator.run(&course, &out).await;

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].prompt, "Welcome to the course.\nToday we cover ownership.");
    assert!(requests[1].prompt.contains("Borrowing rules."));
    assert!(requests[1].prompt.contains("[Image: Borrow diagram]"));
    assert!(requests[2].prompt.contains("--- glossary.txt ---"));

    let lesson = fs::read_to_string(out.join("01 Basics/01_intro_summary.md")).unwrap();
    assert!(lesson.contains("### Insights from Web Materials"));
    assert!(lesson.contains("### Additional Materials"));
}

#[test]
fn test_plan_course() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("course");
    basic_course(&root);
    fs::write(root.join("01 Basics/00_welcome.txt"), "hi").unwrap();

    let course = CourseLayout::scan(&root).unwrap();
    let plan = plan_course(&course, &DigitPrefixPolicy);

    assert_eq!(plan.len(), 1);
    let lesson = &plan[0].lessons[0];
    assert_eq!(lesson.title, "01_intro");
    assert_eq!(lesson.documents.len(), 1);
    assert_eq!(lesson.orphans.len(), 1);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json[0]["lessons"][0]["key"], "01");
}
