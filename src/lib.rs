//! Product poster studio: upload a product photo, pick a scene style, and have a
//! generative model produce an ad poster plus three captioned close-ups.

pub mod api;
pub mod config;
pub mod events;
pub mod gemini;
pub mod history;
pub mod io;
pub mod keygate;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod styles;
pub mod types;

use std::sync::Arc;

use config::AppCfg;
use gemini::GeminiProvider;
use keygate::KeyGate;
use providers::{CreativeProvider, MockProvider};

/// Builds the key gate for the configured provider. Mock needs no key; Gemini is
/// opened right away when its key variable is set and waits for one otherwise.
pub fn key_gate(cfg: &AppCfg) -> KeyGate {
    match cfg.provider.kind.as_str() {
        "mock" => KeyGate::open(Arc::new(MockProvider::new())),
        _ => {
            let provider_cfg = cfg.provider.clone();
            let build = move |key: String| -> Arc<dyn CreativeProvider> {
                let p = GeminiProvider::new(key, provider_cfg.text_model.clone(), provider_cfg.image_model.clone());
                match &provider_cfg.base_url {
                    Some(url) => Arc::new(p.with_base_url(url.clone())),
                    None => Arc::new(p),
                }
            };
            match cfg.api_key() {
                Some(key) => KeyGate::open(build(key)),
                None => {
                    tracing::warn!(env = %cfg.provider.api_key_env, "no API key in environment; waiting for one");
                    KeyGate::pending(build)
                }
            }
        }
    }
}
