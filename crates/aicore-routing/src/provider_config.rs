//! Provider kinds and endpoint configuration

use aicore_core::{Result, provider::Provider};
use aicore_egress::{
    anthropic::{AnthropicConfig, AnthropicConnector},
    client::HttpClientConfig,
    gemini::{GeminiConfig, GeminiConnector},
    model_fetcher::ModelFetcherConfig,
    openai::{OpenAIConfig, OpenAIConnector},
    openrouter::{OpenRouterConfig, OpenRouterConnector},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The vendors AI-Core can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
    ];

    /// Registry and settings key
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Get default base URL for this provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where each adapter sends its requests
///
/// Every base URL is optional and falls back to the vendor's public endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub openrouter_base_url: Option<String>,

    /// Shared HTTP client settings
    pub http: HttpClientConfig,
}

impl EndpointConfig {
    /// Get the effective base URL (configured or default)
    pub fn base_url(&self, kind: ProviderKind) -> &str {
        let configured = match kind {
            ProviderKind::OpenAI => &self.openai_base_url,
            ProviderKind::Anthropic => &self.anthropic_base_url,
            ProviderKind::Gemini => &self.gemini_base_url,
            ProviderKind::OpenRouter => &self.openrouter_base_url,
        };
        configured
            .as_deref()
            .unwrap_or_else(|| kind.default_base_url())
    }

    pub fn with_base_url(mut self, kind: ProviderKind, base_url: impl Into<String>) -> Self {
        let base_url = Some(base_url.into());
        match kind {
            ProviderKind::OpenAI => self.openai_base_url = base_url,
            ProviderKind::Anthropic => self.anthropic_base_url = base_url,
            ProviderKind::Gemini => self.gemini_base_url = base_url,
            ProviderKind::OpenRouter => self.openrouter_base_url = base_url,
        }
        self
    }

    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Live model listing uses the same endpoints as the adapters
    pub fn model_fetcher_config(&self) -> ModelFetcherConfig {
        ModelFetcherConfig {
            openai_base_url: self.base_url(ProviderKind::OpenAI).to_string(),
            anthropic_base_url: self.base_url(ProviderKind::Anthropic).to_string(),
            gemini_base_url: self.base_url(ProviderKind::Gemini).to_string(),
            client_config: self.http.clone(),
            ..ModelFetcherConfig::default()
        }
    }

    /// Construct the adapter for `kind` holding `api_key` (may be empty)
    pub fn build_provider(&self, kind: ProviderKind, api_key: &str) -> Result<Arc<dyn Provider>> {
        let base_url = self.base_url(kind);
        let http = self.http.clone();

        let provider: Arc<dyn Provider> = match kind {
            ProviderKind::OpenAI => Arc::new(OpenAIConnector::new(
                OpenAIConfig::new(api_key)
                    .with_base_url(base_url)
                    .with_client_config(http),
            )?),
            ProviderKind::Anthropic => Arc::new(AnthropicConnector::new(
                AnthropicConfig::new(api_key)
                    .with_base_url(base_url)
                    .with_client_config(http),
            )?),
            ProviderKind::Gemini => Arc::new(GeminiConnector::new(
                GeminiConfig::new(api_key)
                    .with_base_url(base_url)
                    .with_client_config(http),
            )?),
            ProviderKind::OpenRouter => Arc::new(OpenRouterConnector::new(
                OpenRouterConfig::new(api_key)
                    .with_base_url(base_url)
                    .with_client_config(http),
            )?),
        };
        Ok(provider)
    }
}
