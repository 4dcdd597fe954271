//! Persisted settings types

use crate::provider::mask_api_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Storage key for the settings blob
pub const SETTINGS_KEY: &str = "smashingapps_ai_core_settings";

/// Storage key for the usage-stats blob
pub const STATS_KEY: &str = "smashingapps_ai_core_stats";

/// Schema version of [`AISettings`]. A stored blob with any other version is
/// replaced by defaults on load.
pub const SETTINGS_VERSION: u32 = 1;

/// Model used by `chat` when settings carry no default model
pub const FALLBACK_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Per-provider persisted configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    pub display_name: String,
    pub enabled: bool,
    pub api_key: String,
    pub default_model: String,
    pub supports_images: bool,
    pub supports_streaming: bool,
}

impl ProviderConfig {
    fn disabled(name: &str, display_name: &str, default_model: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            enabled: false,
            api_key: String::new(),
            default_model: default_model.to_string(),
            supports_images: true,
            supports_streaming: true,
        }
    }

    /// Enabled and holding a non-empty key
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("enabled", &self.enabled)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("default_model", &self.default_model)
            .field("supports_images", &self.supports_images)
            .field("supports_streaming", &self.supports_streaming)
            .finish()
    }
}

/// Partial update applied to one [`ProviderConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUpdate {
    pub display_name: Option<String>,
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    pub supports_images: Option<bool>,
    pub supports_streaming: Option<bool>,
}

impl ProviderConfigUpdate {
    /// Update that sets a key and derives `enabled` from its non-emptiness
    pub fn api_key(api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            enabled: Some(!api_key.is_empty()),
            ..Default::default()
        }
    }

    pub fn apply(self, config: &mut ProviderConfig) {
        if let Some(display_name) = self.display_name {
            config.display_name = display_name;
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(default_model) = self.default_model {
            config.default_model = default_model;
        }
        if let Some(supports_images) = self.supports_images {
            config.supports_images = supports_images;
        }
        if let Some(supports_streaming) = self.supports_streaming {
            config.supports_streaming = supports_streaming;
        }
    }
}

/// Persisted singleton settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AISettings {
    /// Missing in a stored blob reads as 0, which forces a migration
    #[serde(default)]
    pub version: u32,

    pub providers: BTreeMap<String, ProviderConfig>,

    pub default_provider: String,

    pub default_model: String,

    pub enable_stats: bool,

    /// Persisted but not enforced: no response caching exists in the
    /// dispatch path.
    pub enable_caching: bool,

    /// Cache lifetime in seconds, unenforced like `enable_caching`
    pub cache_duration: u64,
}

impl Default for AISettings {
    fn default() -> Self {
        let providers = [
            ProviderConfig::disabled("openai", "OpenAI", "gpt-4o-mini"),
            ProviderConfig::disabled("anthropic", "Anthropic Claude", "claude-sonnet-4-20250514"),
            ProviderConfig::disabled("gemini", "Google Gemini", "gemini-2.0-flash-exp"),
            ProviderConfig::disabled("openrouter", "OpenRouter", "openai/gpt-4o-mini"),
        ]
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect();

        Self {
            version: SETTINGS_VERSION,
            providers,
            default_provider: "openai".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            enable_stats: true,
            enable_caching: true,
            cache_duration: 3600,
        }
    }
}

impl AISettings {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Names of providers that are enabled with a non-empty key
    pub fn configured_providers(&self) -> Vec<String> {
        self.providers
            .values()
            .filter(|p| p.is_configured())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Model `chat` falls back to when the caller names none
    pub fn chat_model(&self) -> &str {
        if self.default_model.is_empty() {
            FALLBACK_CHAT_MODEL
        } else {
            &self.default_model
        }
    }
}

/// Shallow partial update of [`AISettings`]. A `providers` map replaces the
/// stored map wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub providers: Option<BTreeMap<String, ProviderConfig>>,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub enable_stats: Option<bool>,
    pub enable_caching: Option<bool>,
    pub cache_duration: Option<u64>,
}

impl SettingsUpdate {
    pub fn apply(self, settings: &mut AISettings) {
        if let Some(providers) = self.providers {
            settings.providers = providers;
        }
        if let Some(default_provider) = self.default_provider {
            settings.default_provider = default_provider;
        }
        if let Some(default_model) = self.default_model {
            settings.default_model = default_model;
        }
        if let Some(enable_stats) = self.enable_stats {
            settings.enable_stats = enable_stats;
        }
        if let Some(enable_caching) = self.enable_caching {
            settings.enable_caching = enable_caching;
        }
        if let Some(cache_duration) = self.cache_duration {
            settings.cache_duration = cache_duration;
        }
    }
}
