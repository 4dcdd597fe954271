//! OpenRouter egress connector
//!
//! OpenRouter speaks the OpenAI chat-completions wire format; the connector
//! adds the attribution headers and otherwise mirrors the OpenAI path.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, VendorResponseExt, create_client, require_choices},
    openai::{ChatCompletionRequest, ModelList},
};
use aicore_core::{
    normaliser,
    normalized::{Message, NormalisedResponse, RequestOptions},
    provider::{ApiKeySlot, Provider, ProviderCapabilities, probe_api_key},
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

const VENDOR: &str = "OpenRouter";

const PROBE_MODEL: &str = "openai/gpt-3.5-turbo";
const PROBE_MAX_TOKENS: u32 = 5;

const FALLBACK_MODELS: &[&str] = &[
    "openai/gpt-4o",
    "openai/gpt-4o-mini",
    "openai/gpt-3.5-turbo",
    "anthropic/claude-sonnet-4",
    "anthropic/claude-opus-4",
    "google/gemini-2.0-flash-exp",
    "google/gemini-1.5-pro",
];

/// OpenRouter connector configuration
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,

    /// Base URL (default: https://openrouter.ai/api/v1)
    pub base_url: String,

    /// Sent as `HTTP-Referer` for OpenRouter attribution
    pub app_url: String,

    /// Sent as `X-Title`
    pub app_title: String,

    pub client_config: HttpClientConfig,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            app_url: "https://smashingapps.ai".to_string(),
            app_title: "SmashingApps".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self {
        self.app_url = app_url.into();
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// OpenRouter connector
pub struct OpenRouterConnector {
    base_url: String,
    app_url: String,
    app_title: String,
    api_key: ApiKeySlot,
    client: Client,
}

impl OpenRouterConnector {
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            base_url: config.base_url,
            app_url: config.app_url,
            app_title: config.app_title,
            api_key: ApiKeySlot::new(config.api_key),
            client,
        })
    }

    async fn fetch_model_ids(&self) -> Result<Vec<String>> {
        let raw = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(self.api_key.expose())
            .send()
            .await?
            .handle_vendor_response(VENDOR)
            .await?;

        let list: ModelList = serde_json::from_value(raw)
            .map_err(|e| EgressError::ParseError(format!("Failed to parse model list: {}", e)))?;

        let mut models: Vec<String> = list.data.into_iter().map(|m| m.id).collect();
        models.sort();
        Ok(models)
    }
}

#[async_trait]
impl Provider for OpenRouterConnector {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn set_api_key(&self, api_key: &str) {
        self.api_key.set(api_key);
    }

    fn api_key(&self) -> String {
        self.api_key.masked()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_set()
    }

    #[instrument(skip(self, messages, options), fields(model = %options.model))]
    async fn send_request(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> aicore_core::Result<NormalisedResponse> {
        if !self.api_key.is_set() {
            return Err(EgressError::NotConfigured { vendor: VENDOR }.into());
        }

        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ OpenRouter Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ Authorization: Bearer <api_key>");
        debug!("│ HTTP-Referer: {}", self.app_url);
        debug!("│ X-Title: {}", self.app_title);
        debug!("└─────────────────────────────────────────────────────────");

        let raw = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(&ChatCompletionRequest::new(messages, options))
            .send()
            .await
            .map_err(EgressError::from)?
            .handle_vendor_response(VENDOR)
            .await?;

        Ok(require_choices(VENDOR, normaliser::normalise_openrouter(&raw))?)
    }

    async fn test_api_key(&self) -> bool {
        probe_api_key(self, PROBE_MODEL, PROBE_MAX_TOKENS).await
    }

    async fn available_models(&self) -> Vec<String> {
        if !self.api_key.is_set() {
            return Vec::new();
        }

        match self.fetch_model_ids().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to fetch OpenRouter models, using fallback list: {}", e);
                FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_streaming: true,
            supports_images: true,
        }
    }
}
