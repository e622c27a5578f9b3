//! Google Generative Language backend for the studio.

use async_trait::async_trait;
use base64::Engine;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prompts;
use crate::providers::{AdImageRequest, CreativeProvider, DetailRequest, ProviderError, DETAIL_COUNT};
use crate::styles::StyleTemplate;
use crate::types::{DetailResult, EncodedImage, ImageHandle};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, text_model: String, image_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model,
            image_model,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate_content(&self, model: &str, body: &GeminiRequest) -> Result<Vec<ResponsePart>, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), text));
        }

        let parsed: GeminiResponse = resp.json().await?;
        parsed.into_parts()
    }

    async fn text(&self, image: &EncodedImage, prompt: &str, json: bool) -> Result<String, ProviderError> {
        let body = GeminiRequest::new(image, prompt, GenerationConfig::text(json));
        let parts = self.generate_content(&self.text_model, &body).await?;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            return Err(ProviderError::UnexpectedResponse("no text in response".into()));
        }
        Ok(text)
    }

    async fn image(&self, image: &EncodedImage, prompt: &str, aspect_ratio: Option<&str>) -> Result<ImageHandle, ProviderError> {
        let body = GeminiRequest::new(image, prompt, GenerationConfig::image(aspect_ratio));
        let parts = self.generate_content(&self.image_model, &body).await?;
        let inline = parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| ProviderError::UnexpectedResponse("no image data in response".into()))?;
        // reject payloads that are not valid base64 before they reach the UI
        base64::engine::general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(ImageHandle { mime_type: inline.mime_type, data: inline.data })
    }
}

fn classify_status(status: u16, text: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(text),
        429 => ProviderError::RateLimited,
        _ => ProviderError::Api { status, message: text },
    }
}

#[async_trait]
impl CreativeProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn suggest_styles(&self, image: &EncodedImage) -> Result<Vec<StyleTemplate>, ProviderError> {
        let raw = self.text(image, prompts::SUGGEST_STYLES, true).await?;
        parse_suggestions(&raw)
    }

    async fn analyze_product(&self, image: &EncodedImage) -> Result<String, ProviderError> {
        let raw = self.text(image, prompts::ANALYZE_PRODUCT, false).await?;
        Ok(raw.trim().to_string())
    }

    async fn generate_ad_image(&self, req: AdImageRequest<'_>) -> Result<ImageHandle, ProviderError> {
        let prompt = prompts::ad_image(&req);
        self.image(req.image, &prompt, Some(req.aspect_ratio.as_ratio())).await
    }

    async fn generate_details(&self, req: DetailRequest<'_>) -> Result<Vec<DetailResult>, ProviderError> {
        let raw = self.text(req.image, &prompts::detail_plan(&req), true).await?;
        let plan = parse_detail_plan(&raw, req.focus_points.as_slice())?;

        // shots render concurrently; one failure fails the whole set
        let shots = plan.into_iter().map(|shot| async move {
            let prompt = prompts::detail_image(req.style_prompt, &shot.prompt, &shot.focus_point);
            let image = self.image(req.image, &prompt, Some("1:1")).await?;
            Ok::<_, ProviderError>(DetailResult {
                id: Uuid::new_v4().to_string(),
                image,
                caption: shot.caption,
                focus_point: shot.focus_point,
            })
        });
        try_join_all(shots).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedStyle {
    name: String,
    #[serde(default)]
    description: String,
    prompt: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    preview_color: Option<String>,
}

fn parse_suggestions(raw: &str) -> Result<Vec<StyleTemplate>, ProviderError> {
    let items: Vec<SuggestedStyle> = serde_json::from_str(strip_fence(raw))
        .map_err(|e| ProviderError::UnexpectedResponse(format!("style suggestions: {e}")))?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, s)| StyleTemplate {
            id: format!("suggested-{}-{}", i + 1, &Uuid::new_v4().simple().to_string()[..8]),
            name: s.name,
            description: s.description,
            prompt: s.prompt,
            tags: s.tags,
            preview_color: s.preview_color.unwrap_or_else(|| "#9E9E9E".into()),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlannedShot {
    focus_point: String,
    caption: String,
    #[serde(default)]
    prompt: String,
}

/// Parses the shot plan, keeps at most three shots and pins manual hints onto their slots.
fn parse_detail_plan(raw: &str, manual: &[String]) -> Result<Vec<PlannedShot>, ProviderError> {
    let mut shots: Vec<PlannedShot> = serde_json::from_str(strip_fence(raw))
        .map_err(|e| ProviderError::UnexpectedResponse(format!("detail plan: {e}")))?;
    shots.truncate(DETAIL_COUNT);
    for (shot, point) in shots.iter_mut().zip(manual) {
        if !point.trim().is_empty() {
            shot.focus_point = point.clone();
        }
    }
    Ok(shots)
}

/// Models sometimes wrap JSON answers in a markdown fence.
fn strip_fence(raw: &str) -> &str {
    let t = raw.trim();
    let t = t.strip_prefix("```json").or_else(|| t.strip_prefix("```")).unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn new(image: &EncodedImage, prompt: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData { mime_type: image.mime_type.clone(), data: image.data.clone() },
                    },
                    RequestPart::Text { text: prompt.to_string() },
                ],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

impl GenerationConfig {
    fn text(json: bool) -> Self {
        Self {
            response_mime_type: json.then(|| "application/json".to_string()),
            ..Default::default()
        }
    }

    fn image(aspect_ratio: Option<&str>) -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            image_config: aspect_ratio.map(|r| ImageConfig { aspect_ratio: r.to_string() }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GeminiResponse {
    fn into_parts(self) -> Result<Vec<ResponsePart>, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked(reason));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::UnexpectedResponse("no candidates".into()))?;
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason.contains("SAFETY") || reason.contains("PROHIBITED") || reason == "BLOCKLIST" {
                return Err(ProviderError::Blocked(reason.to_string()));
            }
        }
        Ok(candidate.content.map(|c| c.parts).unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
