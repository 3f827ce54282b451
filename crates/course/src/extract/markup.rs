//! HTML extraction: readable text plus the images a page references.

use super::{ImageLocator, ImageRef, MarkupContent, MarkupExtractor};
use scraper::{ElementRef, Html};
use std::path::Path;
use url::Url;

/// Elements whose whole subtree is dropped.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "nav", "footer", "header", "aside"];

/// Default markup extractor backed by `scraper`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl MarkupExtractor for HtmlExtractor {
    fn extract(&self, path: &Path) -> MarkupContent {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read markup {:?}: {}", path, e);
                return MarkupContent::default();
            }
        };

        let html = String::from_utf8_lossy(&bytes);
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let content = parse_html(&html, base_dir);

        tracing::debug!(
            "Extracted {} characters and {} images from {:?}",
            content.text.len(),
            content.images.len(),
            path
        );
        content
    }
}

/// Parse an HTML document. Relative image sources resolve against `base_dir`.
pub fn parse_html(html: &str, base_dir: &Path) -> MarkupContent {
    let document = Html::parse_document(html);
    let mut text_parts = Vec::new();
    let mut images = Vec::new();

    walk(document.root_element(), base_dir, &mut text_parts, &mut images);

    MarkupContent {
        text: text_parts.join("\n"),
        images,
    }
}

fn walk(
    element: ElementRef<'_>,
    base_dir: &Path,
    text_parts: &mut Vec<String>,
    images: &mut Vec<ImageRef>,
) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                text_parts.push(trimmed.to_string());
            }
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }

        if name == "img" {
            let el = child_element.value();
            match el.attr("src").and_then(|src| resolve_locator(src, base_dir)) {
                Some(locator) => images.push(ImageRef {
                    locator,
                    alt: el
                        .attr("alt")
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                }),
                None => tracing::debug!("Skipping image without usable src"),
            }
        }

        walk(child_element, base_dir, text_parts, images);
    }
}

/// Resolve an `img` source to a fetchable location.
///
/// `data:` URIs and non-web schemes resolve to nothing.
fn resolve_locator(src: &str, base_dir: &Path) -> Option<ImageLocator> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }

    match Url::parse(src) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Some(ImageLocator::Remote(url.to_string()))
        }
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok().map(ImageLocator::Local),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if let Some(rest) = src.strip_prefix("//") {
                return Some(ImageLocator::Remote(format!("https://{}", rest)));
            }
            let relative = src.split(['?', '#']).next().unwrap_or(src);
            Some(ImageLocator::Local(base_dir.join(relative)))
        }
        Err(_) => None,
    }
}
