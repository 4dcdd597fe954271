//! Google Gemini egress connector

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
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const VENDOR: &str = "Gemini";

const PROBE_MODEL: &str = "gemini-2.0-flash-exp";
const PROBE_MAX_TOKENS: u32 = 10;

const FALLBACK_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.0-pro",
];

/// Gemini connector configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter
    pub api_key: String,

    /// Base URL (default: https://generativelanguage.googleapis.com/v1beta)
    pub base_url: String,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// Gemini connector
pub struct GeminiConnector {
    base_url: String,
    api_key: ApiKeySlot,
    client: Client,
}

impl GeminiConnector {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            base_url: config.base_url,
            api_key: ApiKeySlot::new(config.api_key),
            client,
        })
    }

    /// Endpoint URL with the key attached as a query parameter
    fn url(&self, path: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/{}", self.base_url, path),
            &[("key", self.api_key.expose())],
        )
        .map_err(|e| EgressError::ConfigError(format!("Invalid Gemini URL: {}", e)))
    }

    async fn fetch_model_ids(&self) -> Result<Vec<String>> {
        let raw = self
            .client
            .get(self.url("models")?)
            .send()
            .await?
            .handle_vendor_response(VENDOR)
            .await?;

        let list: GeminiModelList = serde_json::from_value(raw)
            .map_err(|e| EgressError::ParseError(format!("Failed to parse model list: {}", e)))?;

        let mut models: Vec<String> = list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == "generateContent")
            })
            .map(|m| strip_models_prefix(&m.name).to_string())
            .collect();
        models.sort();
        Ok(models)
    }
}

#[async_trait]
impl Provider for GeminiConnector {
    fn name(&self) -> &'static str {
        "gemini"
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

        let model = strip_models_prefix(&options.model);
        let gemini_req = to_gemini_request(messages, options);
        debug!("│ POST models/{}:generateContent?key=<api_key>", model);

        let raw = self
            .client
            .post(self.url(&format!("models/{}:generateContent", model))?)
            .json(&gemini_req)
            .send()
            .await
            .map_err(EgressError::from)?
            .handle_vendor_response(VENDOR)
            .await?;

        Ok(require_choices(VENDOR, normaliser::normalise_gemini(&raw))?)
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
                warn!("Failed to fetch Gemini models, using fallback list: {}", e);
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

pub(crate) fn strip_models_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiModelList {
    #[serde(default)]
    pub(crate) models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiModel {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) supported_generation_methods: Vec<String>,
}

// Conversion functions

/// System text is not sent as its own field: the last system message is
/// prepended to the first turn when that turn is a user turn.
fn to_gemini_request(messages: &[Message], options: &RequestOptions) -> GeminiRequest {
    let mut system_instruction: Option<&str> = None;
    let mut contents = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => system_instruction = Some(message.content.as_str()),
            Role::User | Role::Assistant => contents.push(GeminiContent {
                role: if message.role == Role::Assistant {
                    "model"
                } else {
                    "user"
                },
                parts: vec![GeminiPart {
                    text: message.content.clone(),
                }],
            }),
        }
    }

    if let Some(system) = system_instruction.filter(|s| !s.is_empty())
        && let Some(first) = contents.first_mut().filter(|c| c.role == "user")
        && let Some(part) = first.parts.first_mut()
    {
        part.text = format!("{}\n\n{}", system, part.text);
    }

    if options.temperature.is_some_and(|t| t != 1.0) {
        debug!("Skipping temperature parameter (not supported by every Gemini model)");
    }

    let generation_config = GenerationConfig {
        max_output_tokens: options.max_tokens.filter(|n| *n > 0),
        top_p: options.top_p.filter(|p| *p != 1.0),
    };
    let has_config =
        generation_config.max_output_tokens.is_some() || generation_config.top_p.is_some();

    GeminiRequest {
        contents,
        generation_config: has_config.then_some(generation_config),
    }
}
