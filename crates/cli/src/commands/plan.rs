//! Plan command handler.
//!
//! Shows how files would be grouped into lessons without calling any service.

use clap::Args;
use coursebrief_core::AppResult;
use coursebrief_course::{layout::file_name, plan_course, CourseLayout, DigitPrefixPolicy};
use std::path::PathBuf;

/// Show the lesson plan of a course
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Course directory (one subdirectory per chapter)
    pub course_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    pub async fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing plan command for {:?}", self.course_dir);

        let course = CourseLayout::scan(&self.course_dir)?;
        let chapters = plan_course(&course, &DigitPrefixPolicy);

        if self.json {
            let text = serde_json::to_string_pretty(&chapters)?;
            println!("{}", text);
            return Ok(());
        }

        println!("Course: {}", course.name);
        for chapter in &chapters {
            println!();
            println!("{} ({} lessons)", chapter.name, chapter.lessons.len());
            for lesson in &chapter.lessons {
                let key = lesson.key.as_ref().map(|k| k.as_str()).unwrap_or("-");
                println!("  {} [key {}]", lesson.title, key);
                for path in &lesson.documents {
                    println!("    document  {}", file_name(path));
                }
                for path in &lesson.markup {
                    println!("    markup    {}", file_name(path));
                }
                for path in &lesson.orphans {
                    println!("    attached  {}", file_name(path));
                }
            }
        }

        Ok(())
    }
}
