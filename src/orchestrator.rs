use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::events::StudioEvent;
use crate::history::HistoryStore;
use crate::io::encode_image;
use crate::keygate::KeyGate;
use crate::providers::{AdImageRequest, CreativeProvider, DetailRequest, DETAIL_COUNT};
use crate::styles::{StyleCatalog, StyleTemplate};
use crate::types::{
    DetailResult, EncodedImage, GeneratedImage, GenerationConfig, ImageHandle, ProcessingStep,
};

pub const GENERATION_FAILED: &str = "Generation failed, please try again later.";
pub const SUGGESTION_FAILED: &str = "Could not suggest styles, please check your API key.";

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("no API key selected")]
    NoApiKey,
    #[error("studio is busy: {0:?}")]
    Busy(ProcessingStep),
    #[error("unknown style: {0}")]
    UnknownStyle(String),
    #[error("invalid image: {0:#}")]
    InvalidImage(anyhow::Error),
    /// Shown to the user as-is.
    #[error("{0}")]
    Alert(&'static str),
}

#[derive(Default)]
struct StudioState {
    image: Option<EncodedImage>,
    upload_seq: u64,
    description: String,
    analyzing: bool,
    suggesting: bool,
    catalog: StyleCatalog,
    config: GenerationConfig,
    step: ProcessingStep,
    poster: Option<ImageHandle>,
    details: Vec<DetailResult>,
    history: HistoryStore,
}

impl StudioState {
    /// Clears what belongs to the current photo and invalidates any running analysis.
    fn reset_derived(&mut self) {
        self.upload_seq += 1;
        self.description.clear();
        self.analyzing = false;
        self.config.focus_points = Default::default();
        self.poster = None;
        self.details.clear();
    }
}

/// Read-only view of the studio for the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSnapshot {
    pub has_image: bool,
    pub description: String,
    pub analyzing: bool,
    pub suggesting: bool,
    pub step: ProcessingStep,
    pub selected_style: Option<String>,
    pub config: GenerationConfig,
}

/// The current poster and its close-ups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub poster: Option<ImageHandle>,
    pub details: Vec<DetailResult>,
}

/// What a successful generate call produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub entry: GeneratedImage,
    pub details: Vec<DetailResult>,
}

pub struct Studio {
    gate: KeyGate,
    state: Mutex<StudioState>,
    events: broadcast::Sender<StudioEvent>,
}

impl Studio {
    pub fn new(gate: KeyGate) -> Arc<Self> {
        let (events, _rx) = broadcast::channel(256);
        Arc::new(Self { gate, state: Mutex::new(StudioState::default()), events })
    }

    pub fn gate(&self) -> &KeyGate {
        &self.gate
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.events.subscribe()
    }

    fn emit(&self, evt: StudioEvent) {
        // no subscribers is fine
        let _ = self.events.send(evt);
    }

    fn set_step(&self, step: ProcessingStep) {
        self.state.lock().step = step;
        self.emit(StudioEvent::Step { step });
    }

    fn provider(&self) -> Result<Arc<dyn CreativeProvider>, StudioError> {
        self.gate.provider().ok_or(StudioError::NoApiKey)
    }

    /// Replaces the product photo, clears everything derived from the previous one,
    /// then asks the model for a description. Analysis failures only leave the
    /// description empty. Bytes that are not an image leave the studio untouched.
    pub async fn upload(&self, bytes: &[u8]) -> Result<(), StudioError> {
        let provider = self.provider()?;
        let image = encode_image(bytes).map_err(|e| {
            tracing::warn!(error = %e, "upload rejected");
            StudioError::InvalidImage(e)
        })?;

        let seq = {
            let mut st = self.state.lock();
            if st.step == ProcessingStep::Generating {
                return Err(StudioError::Busy(st.step));
            }
            st.reset_derived();
            st.image = Some(image.clone());
            st.analyzing = true;
            st.upload_seq
        };
        self.set_step(ProcessingStep::Uploading);
        self.set_step(ProcessingStep::Analyzing);
        tracing::info!(mime = %image.mime_type, provider = provider.name(), "analyzing product");

        let analysis = provider.analyze_product(&image).await;

        let description = {
            let mut st = self.state.lock();
            if st.upload_seq != seq {
                // a newer upload or a clear owns the state now
                return Ok(());
            }
            st.analyzing = false;
            match analysis {
                Ok(d) => st.description = d,
                Err(e) => tracing::warn!(error = %e, "product analysis failed"),
            }
            st.description.clone()
        };
        self.set_step(ProcessingStep::Idle);
        self.emit(StudioEvent::Analyzed { description });
        Ok(())
    }

    /// Drops the photo together with everything derived from it.
    pub fn clear_image(&self) -> Result<(), StudioError> {
        {
            let mut st = self.state.lock();
            if st.step == ProcessingStep::Generating {
                return Err(StudioError::Busy(st.step));
            }
            st.reset_derived();
            st.image = None;
        }
        tracing::info!("product image removed");
        self.set_step(ProcessingStep::Idle);
        Ok(())
    }

    /// Overrides the analyzed description. Refused while analysis is still running.
    pub fn set_description(&self, description: impl Into<String>) -> Result<(), StudioError> {
        let mut st = self.state.lock();
        if st.analyzing {
            return Err(StudioError::Busy(ProcessingStep::Analyzing));
        }
        st.description = description.into();
        Ok(())
    }

    /// Asks the model for styles matching the photo. `Ok(None)` when no photo is loaded.
    pub async fn suggest_styles(&self) -> Result<Option<usize>, StudioError> {
        let image = match self.state.lock().image.clone() {
            Some(img) => img,
            None => return Ok(None),
        };
        let provider = self.provider()?;
        {
            let mut st = self.state.lock();
            if st.suggesting {
                return Err(StudioError::Busy(st.step));
            }
            st.suggesting = true;
        }

        let res = provider.suggest_styles(&image).await;

        let mut st = self.state.lock();
        st.suggesting = false;
        match res {
            Ok(styles) => {
                let count = styles.len();
                st.catalog.apply_suggestions(styles);
                drop(st);
                tracing::info!(count, "styles suggested");
                self.emit(StudioEvent::StylesSuggested { count });
                Ok(Some(count))
            }
            Err(e) => {
                drop(st);
                tracing::warn!(error = %e, "style suggestion failed");
                self.emit(StudioEvent::Alert { message: SUGGESTION_FAILED.into() });
                Err(StudioError::Alert(SUGGESTION_FAILED))
            }
        }
    }

    pub fn styles(&self) -> StyleCatalog {
        self.state.lock().catalog.clone()
    }

    pub fn select_style(&self, id: &str) -> Result<StyleTemplate, StudioError> {
        let mut st = self.state.lock();
        if !st.catalog.select(id) {
            return Err(StudioError::UnknownStyle(id.to_string()));
        }
        st.catalog.selected().cloned().ok_or_else(|| StudioError::UnknownStyle(id.to_string()))
    }

    pub fn config(&self) -> GenerationConfig {
        self.state.lock().config.clone()
    }

    pub fn set_config(&self, config: GenerationConfig) {
        self.state.lock().config = config;
    }

    /// Runs poster and detail generation side by side and commits both or neither.
    ///
    /// Without a photo or a selected style this does nothing and returns `Ok(None)`.
    /// On failure the previous poster, details and history are left as they were.
    pub async fn generate(&self) -> Result<Option<GenerationOutcome>, StudioError> {
        let (image, style, description, config) = {
            let mut st = self.state.lock();
            let (Some(image), Some(style)) = (st.image.clone(), st.catalog.selected().cloned()) else {
                return Ok(None);
            };
            if st.step != ProcessingStep::Idle {
                return Err(StudioError::Busy(st.step));
            }
            // claim the busy flag before the lock is released
            st.step = ProcessingStep::Generating;
            (image, style, st.description.clone(), st.config.clone())
        };
        let provider = match self.provider() {
            Ok(p) => p,
            Err(e) => {
                self.state.lock().step = ProcessingStep::Idle;
                return Err(e);
            }
        };
        self.emit(StudioEvent::Step { step: ProcessingStep::Generating });
        tracing::info!(style = %style.id, ratio = config.aspect_ratio.as_ratio(), "generating poster and details");

        let ad = provider.generate_ad_image(AdImageRequest {
            image: &image,
            style_prompt: &style.prompt,
            aspect_ratio: config.aspect_ratio,
            description: &description,
            angle: config.product_angle,
        });
        let details = provider.generate_details(DetailRequest {
            image: &image,
            style_prompt: &style.prompt,
            description: &description,
            focus_points: &config.focus_points,
        });

        match tokio::try_join!(ad, details) {
            Ok((poster, mut details)) => {
                details.truncate(DETAIL_COUNT);
                let entry = {
                    let mut st = self.state.lock();
                    st.poster = Some(poster.clone());
                    st.details = details.clone();
                    let entry = st.history.push(poster, style.short_name()).clone();
                    st.step = ProcessingStep::Idle;
                    entry
                };
                tracing::info!(id = %entry.id, details = details.len(), "generation finished");
                self.emit(StudioEvent::Generated { history_id: entry.id.clone(), details: details.len() });
                self.emit(StudioEvent::Step { step: ProcessingStep::Idle });
                Ok(Some(GenerationOutcome { entry, details }))
            }
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                self.set_step(ProcessingStep::Idle);
                self.emit(StudioEvent::Alert { message: GENERATION_FAILED.into() });
                Err(StudioError::Alert(GENERATION_FAILED))
            }
        }
    }

    pub fn result(&self) -> GenerationResult {
        let st = self.state.lock();
        GenerationResult { poster: st.poster.clone(), details: st.details.clone() }
    }

    pub fn history(&self) -> Vec<GeneratedImage> {
        self.state.lock().history.list().to_vec()
    }

    pub fn delete_history(&self, id: &str) -> bool {
        self.state.lock().history.delete(id)
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        let st = self.state.lock();
        StudioSnapshot {
            has_image: st.image.is_some(),
            description: st.description.clone(),
            analyzing: st.analyzing,
            suggesting: st.suggesting,
            step: st.step,
            selected_style: st.catalog.selected().map(|s| s.id.clone()),
            config: st.config.clone(),
        }
    }
}
