//! OpenAI egress connector

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, VendorResponseExt, create_client, require_choices},
};
use aicore_core::{
    normaliser,
    normalized::{Message, NormalisedResponse, ReasoningOptions, RequestOptions, Role, TextOptions},
    provider::{ApiKeySlot, Provider, ProviderCapabilities, probe_api_key},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

const VENDOR: &str = "OpenAI";

const PROBE_MODEL: &str = "gpt-3.5-turbo";
const PROBE_MAX_TOKENS: u32 = 5;

const FALLBACK_MODELS: &[&str] = &[
    "gpt-5",
    "gpt-5-pro",
    "gpt-5-mini",
    "gpt-5-nano",
    "o3",
    "o3-pro",
    "o3-mini",
    "o4-mini",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4o",
    "chatgpt-4o-latest",
    "gpt-4o-mini",
    "o1",
    "o1-mini",
    "gpt-3.5-turbo",
];

/// OpenAI connector configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication, may be empty until set at runtime
    pub api_key: String,

    /// Base URL for OpenAI API (default: https://api.openai.com/v1)
    pub base_url: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl OpenAIConfig {
    /// Create a new OpenAI configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the base URL (for custom endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// OpenAI connector
pub struct OpenAIConnector {
    base_url: String,
    api_key: ApiKeySlot,
    client: Client,
}

impl OpenAIConnector {
    /// Create a new OpenAI connector
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            base_url: config.base_url,
            api_key: ApiKeySlot::new(config.api_key),
            client,
        })
    }

    /// Raw metadata for one model, `None` on any failure
    pub async fn get_model_metadata(&self, model_id: &str) -> Option<Value> {
        if !self.api_key.is_set() {
            return None;
        }

        let response = self
            .client
            .get(format!("{}/models/{}", self.base_url, model_id))
            .bearer_auth(self.api_key.expose())
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => response.json::<Value>().await.ok(),
            Ok(response) => {
                debug!(model_id, "Model metadata lookup returned {}", response.status());
                None
            }
            Err(e) => {
                warn!(model_id, "Failed to fetch model metadata: {}", e);
                None
            }
        }
    }

    async fn post_chat_completions(&self, body: &ChatCompletionRequest<'_>) -> Result<Value> {
        debug!("┌─────────────────────────────────────────────────────────");
        debug!("│ OpenAI Request Headers");
        debug!("├─────────────────────────────────────────────────────────");
        debug!("│ Authorization: Bearer <api_key>");
        debug!("│ Content-Type: application/json");
        debug!("└─────────────────────────────────────────────────────────");

        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await?
            .handle_vendor_response(VENDOR)
            .await
    }

    async fn post_responses(&self, body: &ResponsesRequest<'_>) -> Result<Value> {
        self.client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await?
            .handle_vendor_response(VENDOR)
            .await
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

        Ok(rank_chat_models(list.data.into_iter().map(|m| m.id)))
    }
}

#[async_trait]
impl Provider for OpenAIConnector {
    fn name(&self) -> &'static str {
        "openai"
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

        let raw = if uses_responses_api(&options.model) {
            debug!("Using /v1/responses endpoint");
            self.post_responses(&ResponsesRequest::new(messages, options))
                .await?
        } else {
            debug!("Using /v1/chat/completions endpoint");
            self.post_chat_completions(&ChatCompletionRequest::new(messages, options))
                .await?
        };

        Ok(require_choices(VENDOR, normaliser::normalise_openai(&raw))?)
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
                warn!("Failed to fetch OpenAI models, using fallback list: {}", e);
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

/// GPT-5 and the o-series only accept the Responses API and the default
/// temperature.
pub fn uses_responses_api(model: &str) -> bool {
    ["gpt-5", "o3", "o4", "o1"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Keep chat-capable ids, newest generation first, alphabetical within one
fn rank_chat_models(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut models: Vec<String> = ids
        .filter(|id| ["gpt", "o1", "o3", "chatgpt"].iter().any(|k| id.contains(k)))
        .collect();
    models.sort_by(|a, b| {
        generation_priority(a)
            .cmp(&generation_priority(b))
            .then_with(|| a.cmp(b))
    });
    models
}

fn generation_priority(id: &str) -> u8 {
    const GENERATIONS: &[&str] = &["gpt-5", "o3", "gpt-4.1", "gpt-4o", "o1", "gpt-4", "gpt-3.5"];
    GENERATIONS
        .iter()
        .position(|g| id.contains(g))
        .map_or(8, |p| p as u8 + 1)
}

/// Flatten a conversation into the Responses API `input` string
fn flatten_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let label = match m.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", label, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// OpenAI API types

/// `/chat/completions` payload, shared with OpenRouter
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

impl<'a> ChatCompletionRequest<'a> {
    pub(crate) fn new(messages: &'a [Message], options: &'a RequestOptions) -> Self {
        Self {
            model: &options.model,
            messages,
            max_tokens: options.max_tokens.filter(|n| *n > 0),
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stop: &options.stop,
        }
    }
}

/// `/responses` payload
#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<&'a ReasoningOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a TextOptions>,
}

impl<'a> ResponsesRequest<'a> {
    fn new(messages: &[Message], options: &'a RequestOptions) -> Self {
        Self {
            model: &options.model,
            input: flatten_messages(messages),
            max_output_tokens: options.max_tokens.filter(|n| *n > 0),
            reasoning: options.reasoning.as_ref(),
            text: options.text.as_ref(),
        }
    }
}

/// `GET /models` listing, shared with OpenRouter
#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    #[serde(default)]
    pub(crate) data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelEntry {
    pub(crate) id: String,
}
