use parking_lot::RwLock;
use std::sync::Arc;

use crate::providers::CreativeProvider;

type Factory = Box<dyn Fn(String) -> Arc<dyn CreativeProvider> + Send + Sync>;

/// Holds the model client once an API key has been selected. Until then every
/// model-backed studio operation is refused.
pub struct KeyGate {
    factory: Option<Factory>,
    current: RwLock<Option<Arc<dyn CreativeProvider>>>,
}

impl KeyGate {
    /// A provider that needs no key, or whose key was already resolved.
    pub fn open(provider: Arc<dyn CreativeProvider>) -> Self {
        Self { factory: None, current: RwLock::new(Some(provider)) }
    }

    /// Waits for [`KeyGate::select_key`]; `factory` builds the client from the key.
    pub fn pending<F>(factory: F) -> Self
    where
        F: Fn(String) -> Arc<dyn CreativeProvider> + Send + Sync + 'static,
    {
        Self { factory: Some(Box::new(factory)), current: RwLock::new(None) }
    }

    pub fn has_key(&self) -> bool {
        self.current.read().is_some()
    }

    /// Installs a key. Returns false for blank keys or when the gate has no factory.
    pub fn select_key(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        match &self.factory {
            Some(factory) => {
                *self.current.write() = Some(factory(key.to_string()));
                tracing::info!("api key selected");
                true
            }
            None => false,
        }
    }

    pub fn provider(&self) -> Option<Arc<dyn CreativeProvider>> {
        self.current.read().clone()
    }
}
