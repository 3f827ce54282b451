//! Source text extraction.
//!
//! Each kind of source has its own trait so tests (and alternative formats)
//! can substitute any one of them.

mod document;
mod markup;
mod subtitle;

pub use document::FileDocumentExtractor;
pub use markup::HtmlExtractor;
pub use subtitle::SubtitleExtractor;

use coursebrief_core::AppResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extracts the transcript of a lesson media file.
///
/// Errors are `AppError::Extraction` when the file is missing or malformed.
pub trait TranscriptExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> AppResult<String>;
}

/// Extracts plain text from a fixed document.
///
/// Never fails: unreadable or unsupported files yield an empty string.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> String;
}

/// Extracts readable text and image references from structured markup.
///
/// Never fails: unreadable files yield empty content.
pub trait MarkupExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> MarkupContent;
}

/// Where an image can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "location", rename_all = "lowercase")]
pub enum ImageLocator {
    /// Absolute `http`/`https` URL
    Remote(String),
    /// File on disk
    Local(PathBuf),
}

impl std::fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An image referenced from a markup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub locator: ImageLocator,
    pub alt: Option<String>,
}

/// Text and images of one markup document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupContent {
    pub text: String,
    pub images: Vec<ImageRef>,
}

/// The full set of extractors used by the lesson processor.
#[derive(Clone)]
pub struct Extractors {
    pub transcript: Arc<dyn TranscriptExtractor>,
    pub document: Arc<dyn DocumentExtractor>,
    pub markup: Arc<dyn MarkupExtractor>,
}

impl Default for Extractors {
    fn default() -> Self {
        Self {
            transcript: Arc::new(SubtitleExtractor),
            document: Arc::new(FileDocumentExtractor),
            markup: Arc::new(HtmlExtractor),
        }
    }
}
