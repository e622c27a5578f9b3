use base64::Engine;
use serde::{Deserialize, Serialize};

/// Poster aspect ratios offered by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Square,
    #[default]
    Portrait,
    Story,
    Wide,
}

impl AspectRatio {
    /// Ratio string understood by the image model.
    pub fn as_ratio(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Story => "9:16",
            Self::Wide => "16:9",
        }
    }
}

/// Camera angle the product should be shown from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProductAngle {
    #[default]
    Front,
    #[value(name = "left-45")]
    #[serde(rename = "left-45")]
    Left45,
    #[value(name = "right-45")]
    #[serde(rename = "right-45")]
    Right45,
    Top,
}

impl ProductAngle {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Front => "Front View",
            Self::Left45 => "Left Front 45 Degree View",
            Self::Right45 => "Right Front 45 Degree View",
            Self::Top => "Top View (Flat Lay)",
        }
    }
}

pub const MAX_FOCUS_POINTS: usize = 3;

/// Up to three free-text hints for the detail shots. Entries are kept verbatim,
/// blanks included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FocusPoints(Vec<String>);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("at most 3 focus points are allowed, got {0}")]
pub struct TooManyFocusPoints(pub usize);

impl FocusPoints {
    pub fn new(points: Vec<String>) -> Result<Self, TooManyFocusPoints> {
        if points.len() > MAX_FOCUS_POINTS {
            return Err(TooManyFocusPoints(points.len()));
        }
        Ok(Self(points))
    }

    /// Sets the hint at `index`, padding with blanks. Indexes past the cap are ignored.
    pub fn set(&mut self, index: usize, value: impl Into<String>) -> bool {
        if index >= MAX_FOCUS_POINTS {
            return false;
        }
        while self.0.len() <= index {
            self.0.push(String::new());
        }
        self.0[index] = value.into();
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for FocusPoints {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(d)?;
        FocusPoints::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Per-generation settings chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub aspect_ratio: AspectRatio,
    pub product_angle: ProductAngle,
    pub focus_points: FocusPoints,
}

/// An image returned by the model, kept as base64 so it can be rendered as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHandle {
    pub mime_type: String,
    pub data: String,
}

impl ImageHandle {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.data)
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// The uploaded product photo in transportable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// One poster in the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    pub image: ImageHandle,
    pub style_name: String,
    pub timestamp: i64,
}

/// A close-up shot with its marketing caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResult {
    pub id: String,
    pub image: ImageHandle,
    pub caption: String,
    pub focus_point: String,
}

/// What the studio is currently busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Generating,
}
