//! Fixed-document extraction (PDF and plain text).

use super::DocumentExtractor;
use std::path::Path;

/// Default document extractor.
///
/// `.pdf` goes through `pdf-extract`; `.txt` and `.md` are read as text.
/// Anything else, and any file that cannot be read, gives an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDocumentExtractor;

impl DocumentExtractor for FileDocumentExtractor {
    fn extract(&self, path: &Path) -> String {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let text = match ext.as_str() {
            "pdf" => extract_pdf(path),
            "txt" | "md" | "markdown" => match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    String::new()
                }
            },
            _ => {
                tracing::warn!("Unsupported document type, skipping: {:?}", path);
                String::new()
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            tracing::warn!("No text extracted from {:?}", path);
        } else {
            tracing::debug!("Extracted {} characters from {:?}", text.len(), path);
        }
        text
    }
}

fn extract_pdf(path: &Path) -> String {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read PDF {:?}: {}", path, e);
            return String::new();
        }
    };

    // pdf-extract panics on some malformed inputs.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!("Failed to extract text from PDF {:?} (encrypted or damaged): {}", path, e);
            String::new()
        }
        Err(_) => {
            tracing::warn!("PDF parser aborted on {:?}", path);
            String::new()
        }
    }
}
