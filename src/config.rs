use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::gemini::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCfg {
    pub kind: String, // "mock" | "gemini"
    pub text_model: String,
    pub image_model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        Self {
            kind: "gemini".into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            api_key_env: "GEMINI_API_KEY".into(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCfg {
    pub provider: ProviderCfg,
    pub bind: String,
    pub out_dir: PathBuf,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            provider: ProviderCfg::default(),
            bind: "127.0.0.1:8787".into(),
            out_dir: PathBuf::from("out"),
        }
    }
}

impl AppCfg {
    /// Reads the YAML file when given (defaults otherwise), then applies `POSTERKIT_*` overrides.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let txt = tokio::fs::read_to_string(p)
                    .await
                    .with_context(|| format!("Failed to read config file: {}", p.display()))?;
                serde_yaml::from_str(&txt).context("Failed to parse config YAML")?
            }
            None => AppCfg::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("POSTERKIT_PROVIDER") { self.provider.kind = v; }
        if let Some(v) = var("POSTERKIT_TEXT_MODEL") { self.provider.text_model = v; }
        if let Some(v) = var("POSTERKIT_IMAGE_MODEL") { self.provider.image_model = v; }
        if let Some(v) = var("POSTERKIT_BIND") { self.bind = v; }
        if let Some(v) = var("POSTERKIT_OUT_DIR") { self.out_dir = PathBuf::from(v); }
    }

    /// API key from the environment variable named in the provider section.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.provider.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}
