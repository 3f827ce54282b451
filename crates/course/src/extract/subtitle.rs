//! WebVTT and SRT transcript extraction.
//!
//! Only cue text is kept. Headers, `NOTE`/`STYLE`/`REGION` blocks, cue
//! identifiers, timing lines and inline tags are dropped.

use super::TranscriptExtractor;
use coursebrief_core::{AppError, AppResult};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+:)?\d{1,2}:\d{2}[.,]\d{3}\s+-->\s+(\d+:)?\d{1,2}:\d{2}[.,]\d{3}")
        .expect("timing regex compiles")
});
static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtitleFormat {
    WebVtt,
    Srt,
}

/// Default transcript extractor for `.vtt` and `.srt` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtitleExtractor;

impl TranscriptExtractor for SubtitleExtractor {
    fn extract(&self, path: &Path) -> AppResult<String> {
        if !path.is_file() {
            return Err(AppError::Extraction(format!(
                "Transcript not found: {}",
                path.display()
            )));
        }

        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("srt") => SubtitleFormat::Srt,
            _ => SubtitleFormat::WebVtt,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Extraction(format!(
                "Transcript {} is malformed or unreadable: {}",
                path.display(),
                e
            ))
        })?;

        let text = parse_cues(&raw, format).map_err(|reason| {
            AppError::Extraction(format!(
                "Transcript {} is malformed: {}",
                path.display(),
                reason
            ))
        })?;

        tracing::debug!("Extracted {} characters from {:?}", text.len(), path);
        Ok(text)
    }
}

/// Collect cue text, one cue per line group.
fn parse_cues(raw: &str, format: SubtitleFormat) -> Result<String, String> {
    let raw = raw.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = raw.lines().collect();
    let mut blocks = lines.split(|l| l.trim().is_empty()).filter(|b| !b.is_empty());

    if format == SubtitleFormat::WebVtt {
        match blocks.next() {
            Some(header) if header[0].trim_start().starts_with("WEBVTT") => {}
            _ => return Err("missing WEBVTT header".to_string()),
        }
    }

    let mut cues = Vec::new();
    for block in blocks {
        let first = block[0].trim_start();
        if format == SubtitleFormat::WebVtt
            && ["NOTE", "STYLE", "REGION"]
                .iter()
                .any(|kw| first == *kw || first.starts_with(&format!("{} ", kw)))
        {
            continue;
        }

        let Some(timing_idx) = block.iter().position(|l| l.contains("-->")) else {
            return Err(format!("cue without timing line: '{}'", first));
        };
        if timing_idx > 1 || !TIMING_LINE.is_match(block[timing_idx]) {
            return Err(format!("invalid timing line: '{}'", block[timing_idx].trim()));
        }

        let text: Vec<String> = block[timing_idx + 1..]
            .iter()
            .map(|l| clean_cue_line(l))
            .filter(|l| !l.is_empty())
            .collect();
        if !text.is_empty() {
            cues.push(text.join("\n"));
        }
    }

    Ok(cues.join("\n"))
}

fn clean_cue_line(line: &str) -> String {
    INLINE_TAG
        .replace_all(line, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
