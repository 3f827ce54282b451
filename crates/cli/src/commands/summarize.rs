//! Summarize command handler.
//!
//! Runs the full pipeline over a course directory.

use clap::Args;
use coursebrief_core::{config::AppConfig, AppResult};
use coursebrief_course::{summarize_course, LessonStatus, RunReport};
use std::path::PathBuf;

/// Summarize every lesson of a course into Markdown
#[derive(Args, Debug)]
pub struct SummarizeCommand {
    /// Course directory (one subdirectory per chapter)
    pub course_dir: PathBuf,

    /// Output directory (default: resume_<course name>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Custom provider endpoint
    #[arg(long, env = "COURSEBRIEF_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Describe images found in HTML materials
    #[arg(long)]
    pub describe_images: bool,

    /// Tracking sink (none, log, jsonl)
    #[arg(long)]
    pub tracking: Option<String>,

    /// Delay between retries in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl SummarizeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing summarize command for {:?}", self.course_dir);

        let report = summarize_course(config, &self.course_dir).await?;

        if self.json {
            let output = serde_json::json!({
                "course": report.course,
                "outputDir": report.output_dir,
                "index": report.index,
                "lessonsProcessed": report.stats.lessons_processed,
                "lessonsSkipped": report.stats.lessons_skipped,
                "lessonsFailed": report.stats.lessons_failed,
                "chaptersWritten": report.stats.chapters_written,
                "tokens": report.stats.tokens,
                "durationSecs": report.elapsed.as_secs_f64(),
            });
            let text = serde_json::to_string_pretty(&output)?;
            println!("{}", text);
        } else {
            print_summary(&report);
        }

        Ok(())
    }
}

fn print_summary(report: &RunReport) {
    for chapter in &report.chapters {
        println!("{}", chapter.name);
        for lesson in &chapter.lessons {
            let mark = match lesson.status {
                LessonStatus::Done => "done",
                LessonStatus::Skipped => "skipped",
                LessonStatus::Failed => "FAILED",
            };
            println!("  [{}] {}", mark, lesson.title);
        }
    }

    println!();
    println!(
        "Processed {} lessons ({} skipped, {} failed), {} chapters, {} tokens in {:.2}s",
        report.stats.lessons_processed,
        report.stats.lessons_skipped,
        report.stats.lessons_failed,
        report.stats.chapters_written,
        report.stats.tokens,
        report.elapsed.as_secs_f64()
    );
    match &report.index {
        Some(index) => println!("Index: {}", index.display()),
        None => println!("Index could not be written (see log)"),
    }
}
