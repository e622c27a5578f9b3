use async_trait::async_trait;
use image::{ImageBuffer, Rgba};
use uuid::Uuid;

use crate::styles::StyleTemplate;
use crate::types::{AspectRatio, DetailResult, EncodedImage, FocusPoints, ImageHandle, ProductAngle};

/// Failures from the creative model. Callers log these and show a generic alert;
/// nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("content blocked: {0}")]
    Blocked(String),
    #[error("failed to decode: {0}")]
    Decode(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Inputs for the composite poster.
#[derive(Debug, Clone, Copy)]
pub struct AdImageRequest<'a> {
    pub image: &'a EncodedImage,
    pub style_prompt: &'a str,
    pub aspect_ratio: AspectRatio,
    pub description: &'a str,
    pub angle: ProductAngle,
}

/// Inputs for the close-up set. `focus_points` is forwarded exactly as the user typed it.
#[derive(Debug, Clone, Copy)]
pub struct DetailRequest<'a> {
    pub image: &'a EncodedImage,
    pub style_prompt: &'a str,
    pub description: &'a str,
    pub focus_points: &'a FocusPoints,
}

pub const DETAIL_COUNT: usize = 3;

#[async_trait]
pub trait CreativeProvider: Send + Sync {
    async fn suggest_styles(&self, image: &EncodedImage) -> Result<Vec<StyleTemplate>, ProviderError>;
    async fn analyze_product(&self, image: &EncodedImage) -> Result<String, ProviderError>;
    async fn generate_ad_image(&self, req: AdImageRequest<'_>) -> Result<ImageHandle, ProviderError>;
    async fn generate_details(&self, req: DetailRequest<'_>) -> Result<Vec<DetailResult>, ProviderError>;
    fn name(&self) -> &'static str;
}

/// Offline provider that paints small PNGs instead of calling a model.
#[derive(Debug, Default, Clone)]
pub struct MockProvider {
    fail: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with an API error.
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.fail {
            return Err(ProviderError::Api { status: 500, message: "mock failure".into() });
        }
        Ok(())
    }
}

const DEFAULT_FOCUS: [&str; DETAIL_COUNT] = ["Material texture", "Craftsmanship", "Functional detail"];

fn paint(seed: &str, w: u32, h: u32) -> Result<ImageHandle, ProviderError> {
    let salt = seed.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    let mut img = ImageBuffer::<Rgba<u8>, Vec<u8>>::new(w, h);
    for (x, y, p) in img.enumerate_pixels_mut() {
        let v = ((x ^ y) & 0xFF) as u8;
        *p = Rgba([v, 255 - v, salt, 255]);
    }
    let mut png_bytes: Vec<u8> = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| ProviderError::Decode(format!("encode error: {e}")))?;
    Ok(ImageHandle::from_bytes("image/png", &png_bytes))
}

fn mock_size(ratio: AspectRatio) -> (u32, u32) {
    match ratio {
        AspectRatio::Square => (64, 64),
        AspectRatio::Portrait => (48, 64),
        AspectRatio::Story => (36, 64),
        AspectRatio::Wide => (64, 36),
    }
}

#[async_trait]
impl CreativeProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn suggest_styles(&self, _image: &EncodedImage) -> Result<Vec<StyleTemplate>, ProviderError> {
        self.check()?;
        Ok(vec![StyleTemplate {
            id: format!("suggested-{}", Uuid::new_v4().simple()),
            name: "Morning Loft (Suggested)".into(),
            description: "Sunlit loft that matches the product finish.".into(),
            prompt: "Bright loft bathroom, morning light, pale concrete, soft shadows.".into(),
            tags: vec!["loft".into(), "morning".into()],
            preview_color: "#EDE7DF".into(),
        }])
    }

    async fn analyze_product(&self, image: &EncodedImage) -> Result<String, ProviderError> {
        self.check()?;
        Ok(format!("A product photographed as {}.", image.mime_type))
    }

    async fn generate_ad_image(&self, req: AdImageRequest<'_>) -> Result<ImageHandle, ProviderError> {
        self.check()?;
        let (w, h) = mock_size(req.aspect_ratio);
        paint(req.style_prompt, w, h)
    }

    async fn generate_details(&self, req: DetailRequest<'_>) -> Result<Vec<DetailResult>, ProviderError> {
        self.check()?;
        let manual = req.focus_points.as_slice();
        (0..DETAIL_COUNT)
            .map(|i| {
                let focus = match manual.get(i) {
                    Some(p) if !p.trim().is_empty() => p.clone(),
                    _ => DEFAULT_FOCUS[i].to_string(),
                };
                Ok(DetailResult {
                    id: Uuid::new_v4().to_string(),
                    image: paint(&focus, 32, 32)?,
                    caption: format!("{focus}, up close."),
                    focus_point: focus,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> EncodedImage {
        EncodedImage { mime_type: "image/jpeg".into(), data: "AAAA".into() }
    }

    #[tokio::test]
    async fn mock_details_prefer_manual_focus_points() {
        let p = MockProvider::new();
        let img = photo();
        let pts = FocusPoints::new(vec!["Soft-close seat".into(), "  ".into()]).unwrap();
        let details = p
            .generate_details(DetailRequest { image: &img, style_prompt: "x", description: "", focus_points: &pts })
            .await
            .unwrap();
        assert_eq!(details.len(), DETAIL_COUNT);
        assert_eq!(details[0].focus_point, "Soft-close seat");
        assert_eq!(details[1].focus_point, "Craftsmanship");
        assert_eq!(details[2].focus_point, "Functional detail");
    }

    #[tokio::test]
    async fn mock_poster_is_a_png() {
        let p = MockProvider::new();
        let img = photo();
        let handle = p
            .generate_ad_image(AdImageRequest {
                image: &img,
                style_prompt: "studio",
                aspect_ratio: AspectRatio::Wide,
                description: "",
                angle: ProductAngle::Top,
            })
            .await
            .unwrap();
        let bytes = handle.decode().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 36));
    }

    #[tokio::test]
    async fn failing_mock_fails_everything() {
        let p = MockProvider::failing();
        assert!(matches!(p.analyze_product(&photo()).await, Err(ProviderError::Api { status: 500, .. })));
        assert!(p.suggest_styles(&photo()).await.is_err());
    }
}
