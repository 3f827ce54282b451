//! Pipeline-level tests and shared fakes.

mod pipeline;

use crate::extract::{DocumentExtractor, TranscriptExtractor};
use crate::layout::{file_name, file_stem};
use coursebrief_core::{AppError, AppResult};
use std::path::Path;

/// Returns a fixed transcript for any media path, existing or not.
#[derive(Debug, Default)]
pub struct FakeTranscripts;

impl TranscriptExtractor for FakeTranscripts {
    fn extract(&self, path: &Path) -> AppResult<String> {
        let stem = file_stem(path);
        if stem.is_empty() {
            return Err(AppError::Extraction("Transcript not found".to_string()));
        }
        Ok(format!(
            "Transcript of {}. Ownership moves values between bindings.",
            stem
        ))
    }
}

/// Returns a fixed text for any document path.
#[derive(Debug, Default)]
pub struct FakeDocuments;

impl DocumentExtractor for FakeDocuments {
    fn extract(&self, path: &Path) -> String {
        format!("Document text from {}.", file_name(path))
    }
}
