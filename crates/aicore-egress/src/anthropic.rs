//! Anthropic egress connector

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, VendorResponseExt, create_client, require_choices},
};
use aicore_core::{
    normaliser,
    normalized::{Message, NormalisedResponse, RequestOptions, Role},
    provider::{ApiKeySlot, Provider, ProviderCapabilities, probe_api_key},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

const VENDOR: &str = "Anthropic";

/// The vendor requires `max_tokens`; used when the caller sets none
const DEFAULT_MAX_TOKENS: u32 = 4096;

const PROBE_MODEL: &str = "claude-sonnet-4-20250514";
const PROBE_MAX_TOKENS: u32 = 10;

/// Anthropic exposes no listing to this client, so a curated list is served
const KNOWN_MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-opus-4-20250514",
    "claude-3-5-sonnet-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Anthropic connector configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication, may be empty until set at runtime
    pub api_key: String,

    /// Base URL for Anthropic API (default: https://api.anthropic.com)
    pub base_url: String,

    /// Anthropic API version (default: 2023-06-01)
    pub api_version: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl AnthropicConfig {
    /// Create a new Anthropic configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// Anthropic connector
pub struct AnthropicConnector {
    base_url: String,
    api_version: String,
    api_key: ApiKeySlot,
    client: Client,
}

impl AnthropicConnector {
    /// Create a new Anthropic connector
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            base_url: config.base_url,
            api_version: config.api_version,
            api_key: ApiKeySlot::new(config.api_key),
            client,
        })
    }
}

#[async_trait]
impl Provider for AnthropicConnector {
    fn name(&self) -> &'static str {
        "anthropic"
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

        let anthropic_req = to_anthropic_request(messages, options);

        // Log request headers at debug level
        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ Anthropic Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ x-api-key: <api_key>");
        debug!("│ anthropic-version: {}", self.api_version);
        debug!("│ Content-Type: application/json");
        debug!("└─────────────────────────────────────────────────────────");

        let raw = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", &self.api_version)
            .json(&anthropic_req)
            .send()
            .await
            .map_err(EgressError::from)?
            .handle_vendor_response(VENDOR)
            .await?;

        Ok(require_choices(VENDOR, normaliser::normalise_anthropic(&raw))?)
    }

    async fn test_api_key(&self) -> bool {
        probe_api_key(self, PROBE_MODEL, PROBE_MAX_TOKENS).await
    }

    async fn available_models(&self) -> Vec<String> {
        if !self.api_key.is_set() {
            return Vec::new();
        }
        KNOWN_MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_streaming: true,
            supports_images: true,
        }
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

// Conversion functions

/// The first system message becomes the top-level `system` field; every
/// other message is sent as `user` or `assistant`.
fn to_anthropic_request<'a>(
    messages: &'a [Message],
    options: &'a RequestOptions,
) -> AnthropicRequest<'a> {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.as_str());

    let messages = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| AnthropicMessage {
            role: if m.role == Role::Assistant {
                "assistant"
            } else {
                "user"
            },
            content: &m.content,
        })
        .collect();

    AnthropicRequest {
        model: &options.model,
        messages,
        max_tokens: options
            .max_tokens
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        system,
        temperature: options.temperature,
        top_p: options.top_p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_creation() {
        let config = AnthropicConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.api_version, "2023-06-01");
    }

    #[test]
    fn test_config_with_base_url() {
        let config = AnthropicConfig::new("test-key")
            .with_base_url("https://custom.api.com")
            .with_api_version("2024-01-01");

        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.api_version, "2024-01-01");
    }

    #[test]
    fn test_to_anthropic_request_with_system() {
        let messages = vec![
            Message::system("Be terse"),
            Message::user("Hi"),
            Message::assistant("Hello"),
            Message::user("Again"),
        ];
        let options = RequestOptions::new("claude-sonnet-4-20250514").with_temperature(0.5);

        let json = serde_json::to_value(to_anthropic_request(&messages, &options)).unwrap();

        assert_eq!(
            json,
            json!({
                "model": "claude-sonnet-4-20250514",
                "system": "Be terse",
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"},
                    {"role": "user", "content": "Again"}
                ],
                "max_tokens": 4096,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_to_anthropic_request_keeps_only_first_system() {
        let messages = vec![
            Message::system("first"),
            Message::system("second"),
            Message::user("Hi"),
        ];
        let options = RequestOptions::new("claude-3-haiku-20240307").with_max_tokens(64);

        let request = to_anthropic_request(&messages, &options);

        assert_eq!(request.system, Some("first"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.max_tokens, 64);
    }

    #[test]
    fn test_to_anthropic_request_without_system() {
        let messages = vec![Message::user("Hi")];
        let options = RequestOptions::new("claude-3-haiku-20240307");

        let json = serde_json::to_value(to_anthropic_request(&messages, &options)).unwrap();

        assert!(json.get("system").is_none());
        assert!(json.get("top_p").is_none());
        assert_eq!(json["max_tokens"], 4096);
    }

    #[tokio::test]
    async fn test_available_models_requires_key() {
        let connector = AnthropicConnector::new(AnthropicConfig::new("")).unwrap();
        assert!(connector.available_models().await.is_empty());

        connector.set_api_key("sk-ant-api03-abcdefgh");
        let models = connector.available_models().await;
        assert_eq!(models.len(), KNOWN_MODELS.len());
        assert_eq!(models[0], "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn test_unconfigured_request_fails() {
        let connector = AnthropicConnector::new(AnthropicConfig::new("")).unwrap();

        let err = connector
            .send_request(&[Message::user("Hi")], &RequestOptions::new(PROBE_MODEL))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Anthropic API key not configured");
        assert!(!connector.test_api_key().await);
    }
}
