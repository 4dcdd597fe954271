//! Provider registry and model-to-provider inference

use aicore_core::{Result, provider::Provider, settings::AISettings};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::provider_config::{EndpointConfig, ProviderKind};

/// Map of provider name to adapter, built once at startup
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One adapter per [`ProviderKind`], keyed with whatever credential the
    /// settings hold (enabled or not)
    pub fn from_settings(settings: &AISettings, endpoints: &EndpointConfig) -> Result<Self> {
        let mut registry = Self::new();
        for kind in ProviderKind::ALL {
            let api_key = settings
                .provider(kind.name())
                .map(|p| p.api_key.as_str())
                .unwrap_or_default();
            registry.register(endpoints.build_provider(kind, api_key)?);
        }
        debug!(providers = ?registry.names(), "Initialized providers");
        Ok(registry)
    }

    /// Add or replace the adapter registered under `provider.name()`
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Provider>)> {
        self.providers.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Guess the provider from a model id's shape. Ids with a `/` that match no
/// vendor prefix are OpenRouter's `vendor/model` form.
pub fn infer_provider(model: &str) -> Option<ProviderKind> {
    if model.starts_with("gpt-") || model.starts_with("o1") || model.starts_with("o3") {
        return Some(ProviderKind::OpenAI);
    }
    if model.starts_with("claude-") {
        return Some(ProviderKind::Anthropic);
    }
    if model.starts_with("gemini-") || model.starts_with("models/gemini-") {
        return Some(ProviderKind::Gemini);
    }
    if model.contains('/') {
        return Some(ProviderKind::OpenRouter);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicore_core::settings::ProviderConfigUpdate;

    #[test]
    fn test_infer_provider() {
        let cases = [
            ("gpt-4o", Some(ProviderKind::OpenAI)),
            ("o1-mini", Some(ProviderKind::OpenAI)),
            ("o3", Some(ProviderKind::OpenAI)),
            ("claude-3-opus-20240229", Some(ProviderKind::Anthropic)),
            ("gemini-1.5-pro", Some(ProviderKind::Gemini)),
            ("models/gemini-1.5-pro", Some(ProviderKind::Gemini)),
            ("mistralai/mixtral-8x7b", Some(ProviderKind::OpenRouter)),
            ("unknown-model-xyz", None),
            ("o4-mini", None),
            ("", None),
        ];
        for (model, expected) in cases {
            assert_eq!(infer_provider(model), expected, "{model}");
        }
    }

    #[test]
    fn test_from_settings_applies_stored_keys() {
        let mut settings = AISettings::default();
        if let Some(openai) = settings.providers.get_mut("openai") {
            ProviderConfigUpdate::api_key("sk-proj-abcdefghijklmnop").apply(openai);
        }

        let registry =
            ProviderRegistry::from_settings(&settings, &EndpointConfig::default()).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.names(),
            vec!["anthropic", "gemini", "openai", "openrouter"]
        );
        assert!(registry.get("openai").unwrap().is_configured());
        assert!(!registry.get("anthropic").unwrap().is_configured());
        assert!(registry.get("mistral").is_none());
    }
}
