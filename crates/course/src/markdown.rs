//! Markdown documents produced by a run.
//!
//! Everything here is pure: callers decide where the text is written.

use crate::types::ContentKind;
use std::fmt::Write;

/// File name of the course index.
pub const INDEX_FILE_NAME: &str = "index.md";

const LESSON_SUFFIX: &str = "_summary";
const CHAPTER_PREFIX: &str = "_CHAPTER_SUMMARY_";

/// Characters never allowed in generated file names.
const RESERVED: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// One summarized content group of a lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonSection {
    pub kind: ContentKind,
    pub text: String,
}

/// A link from a chapter document to a lesson document.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonLink {
    /// Lesson document file name, relative to the chapter directory
    pub file_name: String,
}

/// A link from the course index to a chapter document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterLink {
    pub chapter: String,
    /// Chapter document file name, relative to the chapter directory
    pub file_name: String,
}

fn sanitize(name: &str, replace_space: bool) -> String {
    name.chars()
        .map(|c| {
            if RESERVED.contains(&c) || (replace_space && c == ' ') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `<sanitized stem>_summary.md`; spaces become underscores too.
pub fn lesson_file_name(stem: &str) -> String {
    format!("{}{}.md", sanitize(stem, true), LESSON_SUFFIX)
}

/// `_CHAPTER_SUMMARY_<sanitized chapter>.md`; spaces are kept.
pub fn chapter_file_name(chapter: &str) -> String {
    format!("{}{}.md", CHAPTER_PREFIX, sanitize(chapter, false))
}

/// Link text for a lesson document: its stem without the summary suffix.
pub fn lesson_link_text(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    stem.replace(LESSON_SUFFIX, "")
}

/// Markdown link target, angle-bracketed when it contains whitespace.
fn link_target(target: &str) -> String {
    if target.chars().any(char::is_whitespace) {
        format!("<{}>", target)
    } else {
        target.to_string()
    }
}

/// Render a lesson document.
///
/// Sections appear in [`ContentKind::ORDER`]. With no sections the document
/// carries a single note instead.
pub fn render_lesson(title: &str, sections: &[LessonSection]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}\n", title);

    if sections.is_empty() {
        out.push_str("*No summary available for this lesson.*\n");
        return out;
    }

    let mut ordered: Vec<&LessonSection> = sections.iter().collect();
    ordered.sort_by_key(|s| ContentKind::ORDER.iter().position(|k| *k == s.kind));

    for (i, section) in ordered.iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n\n");
        }
        let _ = writeln!(out, "### {}\n", section.kind.heading());
        out.push_str(section.text.trim());
        out.push('\n');
    }

    out
}

/// Render a chapter document linking to its lesson documents.
pub fn render_chapter(chapter: &str, lessons: &[LessonLink]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Chapter Summary: {}\n", chapter);
    out.push_str("This chapter includes the following lessons:\n\n");

    for lesson in lessons {
        let _ = writeln!(
            out,
            "- [{}]({})",
            lesson_link_text(&lesson.file_name),
            link_target(&lesson.file_name)
        );
    }

    let _ = write!(out, "\n---\n\n*Summary generated for chapter '{}'.*\n", chapter);
    out
}

/// Render the course index linking to chapter documents.
///
/// An empty chapter list still yields a document, with a placeholder line.
pub fn render_index(course: &str, chapters: &[ChapterLink]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Course Index: {}\n", course);

    if chapters.is_empty() {
        out.push_str("*No chapter summaries were produced for this course.*\n");
    } else {
        out.push_str("This course is organized in the following chapters:\n\n");
        for chapter in chapters {
            let target = format!("{}/{}", chapter.chapter, chapter.file_name);
            let _ = writeln!(
                out,
                "- [Chapter: {}]({})",
                chapter.chapter,
                link_target(&target)
            );
        }
    }

    let _ = write!(out, "\n---\n\n*Index generated for course '{}'.*\n", course);
    out
}
