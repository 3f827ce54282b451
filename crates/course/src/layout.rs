//! Course directory scanning.
//!
//! A course is a directory whose immediate subdirectories are chapters. Each
//! chapter holds lesson media files (subtitles) and supplementary files side
//! by side. Hidden entries (names starting with `.`) are ignored at every
//! level, which also covers macOS `._` resource forks.

use coursebrief_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of lesson media files.
pub const MEDIA_EXTENSIONS: [&str; 2] = ["vtt", "srt"];

/// Extensions of structured markup documents.
pub const MARKUP_EXTENSIONS: [&str; 2] = ["html", "htm"];

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

pub fn is_media(path: &Path) -> bool {
    has_extension(path, &MEDIA_EXTENSIONS)
}

pub fn is_markup(path: &Path) -> bool {
    has_extension(path, &MARKUP_EXTENSIONS)
}

/// File name as a string, lossy for non-UTF-8 names.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File name without its final extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Immediate, non-hidden children of `dir`, sorted by file name.
fn visible_entries(dir: &Path) -> AppResult<Vec<walkdir::DirEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            AppError::Io(std::io::Error::other(format!(
                "Failed to read {:?}: {}",
                dir, e
            )))
        })?;

        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        entries.push(entry);
    }

    Ok(entries)
}

/// One chapter directory.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterLayout {
    pub path: PathBuf,
    pub name: String,
    /// Lesson media files, sorted by file name
    pub media: Vec<PathBuf>,
    /// Every other regular file, sorted by file name
    pub others: Vec<PathBuf>,
}

impl ChapterLayout {
    pub fn scan(dir: &Path) -> AppResult<Self> {
        let mut media = Vec::new();
        let mut others = Vec::new();

        for entry in visible_entries(dir)? {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if is_media(&path) {
                media.push(path);
            } else {
                others.push(path);
            }
        }

        Ok(Self {
            path: dir.to_path_buf(),
            name: file_name(dir),
            media,
            others,
        })
    }
}

/// A scanned course tree.
#[derive(Debug, Clone, Serialize)]
pub struct CourseLayout {
    pub root: PathBuf,
    pub name: String,
    pub chapters: Vec<ChapterLayout>,
}

impl CourseLayout {
    /// Scan `root`, collecting its chapter subdirectories in name order.
    pub fn scan(root: &Path) -> AppResult<Self> {
        if !root.is_dir() {
            return Err(AppError::Config(format!(
                "Course directory not found: {}",
                root.display()
            )));
        }

        let mut chapters = Vec::new();
        for entry in visible_entries(root)? {
            if entry.file_type().is_dir() {
                chapters.push(ChapterLayout::scan(entry.path())?);
            }
        }

        // A relative "." has no file name of its own.
        let name = root
            .canonicalize()
            .map(|p| file_name(&p))
            .unwrap_or_else(|_| file_name(root));

        tracing::debug!(
            "Scanned course '{}': {} chapters",
            name,
            chapters.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            name,
            chapters,
        })
    }
}
