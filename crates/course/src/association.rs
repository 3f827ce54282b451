//! Association of supplementary files with lessons.
//!
//! A file is owned by the lesson whose ordering key equals its own. Files
//! without a matching key are orphans and attach to the nearest lesson that
//! precedes them in byte-wise file-name order, or to the first lesson when
//! they precede every lesson.

use crate::layout::{file_name, file_stem, is_markup, ChapterLayout, CourseLayout};
use crate::markdown::lesson_file_name;
use crate::ordering::{OrderingKey, OrderingKeyPolicy};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One lesson and every file associated with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonPlan {
    /// Primary media file
    pub media: PathBuf,
    /// Display title (media file stem)
    pub title: String,
    pub key: Option<OrderingKey>,
    /// Owned fixed documents, sorted by file name
    pub documents: Vec<PathBuf>,
    /// Owned structured markup, sorted by file name
    pub markup: Vec<PathBuf>,
    /// Orphans attached by proximity, sorted by file name
    pub orphans: Vec<PathBuf>,
}

impl LessonPlan {
    fn new(media: PathBuf, policy: &dyn OrderingKeyPolicy) -> Self {
        let title = file_stem(&media);
        let key = policy.key_of(&title);
        Self {
            media,
            title,
            key,
            documents: Vec::new(),
            markup: Vec::new(),
            orphans: Vec::new(),
        }
    }

    /// Number of supplementary files attached to this lesson.
    pub fn attached_count(&self) -> usize {
        self.documents.len() + self.markup.len() + self.orphans.len()
    }
}

/// Build the lesson plans of one chapter.
///
/// Every non-media file ends up in exactly one plan. A chapter without lessons
/// yields no plans; its files are reported in a warning.
pub fn associate(chapter: &ChapterLayout, policy: &dyn OrderingKeyPolicy) -> Vec<LessonPlan> {
    let mut media = chapter.media.clone();
    media.sort_by_key(|p| file_name(p));

    if media.is_empty() {
        if !chapter.others.is_empty() {
            let names: Vec<String> = chapter.others.iter().map(|p| file_name(p)).collect();
            tracing::warn!(
                "Chapter '{}' has no lessons; unanchored files: {}",
                chapter.name,
                names.join(", ")
            );
        }
        return Vec::new();
    }

    let mut plans: Vec<LessonPlan> = dedupe_media(&chapter.name, media)
        .into_iter()
        .map(|m| LessonPlan::new(m, policy))
        .collect();

    // First lesson in name order owns a shared key.
    let mut owners: HashMap<OrderingKey, usize> = HashMap::new();
    for (idx, plan) in plans.iter().enumerate() {
        if let Some(ref key) = plan.key {
            owners.entry(key.clone()).or_insert(idx);
        }
    }

    let mut others = chapter.others.clone();
    others.sort_by_key(|p| file_name(p));

    for path in others {
        let owner = policy
            .key_of(&file_stem(&path))
            .and_then(|key| owners.get(&key).copied());

        match owner {
            Some(idx) if is_markup(&path) => plans[idx].markup.push(path),
            Some(idx) => plans[idx].documents.push(path),
            None => {
                let idx = preceding_lesson(&plans, &file_name(&path));
                tracing::debug!(
                    "Orphan {:?} attached to lesson '{}'",
                    path,
                    plans[idx].title
                );
                plans[idx].orphans.push(path);
            }
        }
    }

    plans
}

/// Keep one media file per lesson document, preferring WebVTT.
///
/// Two media files whose stems map to the same document name would be two
/// lessons writing one file.
fn dedupe_media(chapter: &str, media: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(media.len());
    let mut by_document: HashMap<String, usize> = HashMap::new();

    for path in media {
        let document = lesson_file_name(&file_stem(&path));
        match by_document.get(&document) {
            Some(&idx) => {
                let dropped = if is_vtt(&path) && !is_vtt(&kept[idx]) {
                    std::mem::replace(&mut kept[idx], path)
                } else {
                    path
                };
                tracing::warn!(
                    "Chapter '{}': ignoring {:?}, {:?} already covers this lesson",
                    chapter,
                    file_name(&dropped),
                    file_name(&kept[idx])
                );
            }
            None => {
                by_document.insert(document, kept.len());
                kept.push(path);
            }
        }
    }

    kept
}

fn is_vtt(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("vtt"))
}

/// Lesson plans of one chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterPlan {
    pub name: String,
    pub lessons: Vec<LessonPlan>,
}

/// Associate every chapter of a scanned course.
pub fn plan_course(course: &CourseLayout, policy: &dyn OrderingKeyPolicy) -> Vec<ChapterPlan> {
    course
        .chapters
        .iter()
        .map(|chapter| ChapterPlan {
            name: chapter.name.clone(),
            lessons: associate(chapter, policy),
        })
        .collect()
}

/// Index of the last lesson whose media file name sorts before `name`.
fn preceding_lesson(plans: &[LessonPlan], name: &str) -> usize {
    plans
        .iter()
        .rposition(|p| file_name(&p.media).as_str() < name)
        .unwrap_or(0)
}
