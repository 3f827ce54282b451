//! Image descriptions for markup documents.

use crate::extract::{ImageLocator, ImageRef};
use crate::tracking::{report_call, CallRecord, CallStatus, Tracker};
use crate::types::CallContext;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use coursebrief_core::{AppError, AppResult};
use coursebrief_llm::{LlmClient, LlmRequest, LlmUsage};
use coursebrief_prompt::{PromptKind, PromptLibrary};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Text block standing in for an image, with the usage it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescription {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

impl ImageDescription {
    fn unavailable(image: &ImageRef, usage: Option<LlmUsage>) -> Self {
        Self {
            text: format!("[Image description unavailable: {}]", label(image)),
            usage,
        }
    }
}

/// Turns an image reference into a short text block.
///
/// Never fails: problems become a bracketed notice in the returned text.
#[async_trait::async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(&self, image: &ImageRef, ctx: &CallContext) -> ImageDescription;
}

fn label(image: &ImageRef) -> String {
    image.alt.clone().unwrap_or_else(|| match &image.locator {
        ImageLocator::Remote(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
        ImageLocator::Local(path) => crate::layout::file_name(path),
    })
}

/// Placeholder describer: uses the alt text only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullImageDescriber;

#[async_trait::async_trait]
impl ImageDescriber for NullImageDescriber {
    async fn describe(&self, image: &ImageRef, _ctx: &CallContext) -> ImageDescription {
        ImageDescription {
            text: format!("[Image: {}]", label(image)),
            usage: None,
        }
    }
}

/// Describes images through a vision-capable model.
pub struct LlmImageDescriber {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    tracker: Arc<dyn Tracker>,
    model: String,
}

impl LlmImageDescriber {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        tracker: Arc<dyn Tracker>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompts,
            tracker,
            model: model.into(),
        }
    }

    async fn request_description(
        &self,
        image: &ImageRef,
        ctx: &CallContext,
    ) -> AppResult<ImageDescription> {
        let image_url = match &image.locator {
            ImageLocator::Remote(url) => url.clone(),
            ImageLocator::Local(path) => data_url(path)?,
        };

        let built = self
            .prompts
            .build(PromptKind::Image, image.alt.as_deref().unwrap_or(""))?;
        let mut request = LlmRequest::new(built.user.clone(), &self.model).with_image(image_url);
        if let Some(max_tokens) = built.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let started = Instant::now();
        let result = self.client.complete(&request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (output, usage, status, error) = match &result {
            Ok(response) if response.content.trim().is_empty() => (
                None,
                response.usage,
                CallStatus::Degraded,
                Some("empty".to_string()),
            ),
            Ok(response) => (
                Some(response.content.clone()),
                response.usage,
                CallStatus::Success,
                None,
            ),
            Err(e) => (
                None,
                None,
                CallStatus::Failed,
                Some(e.service_kind().map(|k| k.as_tag()).unwrap_or("unexpected").to_string()),
            ),
        };

        report_call(
            self.tracker.as_ref(),
            &CallRecord {
                context: ctx.clone(),
                prompt_kind: PromptKind::Image,
                attempt: 1,
                model: self.model.clone(),
                input: format!("{}\nImage: {}", built.user, image.locator),
                output,
                usage,
                latency_ms,
                status,
                error,
            },
        );

        let response = result?;
        let text = response.content.trim();
        if text.is_empty() {
            tracing::warn!("Empty description for image {}", image.locator);
            return Ok(ImageDescription::unavailable(image, response.usage));
        }
        Ok(ImageDescription {
            text: format!("[Image: {}]\n{}", label(image), text),
            usage: response.usage,
        })
    }
}

#[async_trait::async_trait]
impl ImageDescriber for LlmImageDescriber {
    async fn describe(&self, image: &ImageRef, ctx: &CallContext) -> ImageDescription {
        match self.request_description(image, ctx).await {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!("Image description failed for {}: {}", image.locator, e);
                ImageDescription::unavailable(image, None)
            }
        }
    }
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}

/// Encode a local image as a `data:` URL.
fn data_url(path: &Path) -> AppResult<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        AppError::Extraction(format!("Failed to read image {}: {}", path.display(), e))
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime_type(path),
        BASE64_STANDARD.encode(bytes)
    ))
}
