//! Live model catalogue fetcher
//!
//! Queries each vendor's model-listing endpoint and classifies the results
//! into chat and image models, independent of the static model registry.
//! Only canonical ids are kept: ids with a date suffix (`2024-05-13`) or an
//! alias suffix (`-preview`, `-latest`) are dropped so one model family shows
//! up once.
//!
//! Every per-vendor failure degrades to an empty list.

use crate::{
    EgressError, Result,
    client::{HttpClientConfig, VendorResponseExt, create_client},
    gemini::{GeminiModelList, strip_models_prefix},
};
use chrono::DateTime;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

static DATE_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b20\d{2}-\d{2}-\d{2}\b").unwrap());
static ALIAS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)-(preview|latest)$").unwrap());
static GEMINI_VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)gemini-(\d+(?:\.\d+)?)").unwrap());

static OPENAI_NON_TEXT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(audio|realtime|tts|transcribe|embed|embedding|whisper)").unwrap());
static OPENAI_NON_IMAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(audio|realtime|tts|transcribe|embed|embedding)").unwrap());
static OPENAI_IMAGE_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(gpt-image-1|dall-e)").unwrap());
static OPENAI_CHAT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(gpt-|o\d|chatgpt-)").unwrap());
static OPENAI_IMAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(gpt-image-1|dall-e|gpt-4o|chatgpt-4o)").unwrap());

static EMBED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(embed|embedding)").unwrap());
static IMAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)image").unwrap());
static GEMINI_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^gemini-").unwrap());

/// Which class of model to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    Chat,
    Image,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Chat => write!(f, "chat"),
            FetchKind::Image => write!(f, "image"),
        }
    }
}

/// One model discovered from a live listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedModel {
    pub provider: String,
    pub id: String,
    pub display_name: String,
    /// Creation time in epoch milliseconds, when the vendor reports one
    pub created: Option<i64>,
    #[serde(rename = "type")]
    pub kind: FetchKind,
}

/// Vendor endpoints used by the fetcher
#[derive(Debug, Clone)]
pub struct ModelFetcherConfig {
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub anthropic_version: String,
    pub gemini_base_url: String,
    pub client_config: HttpClientConfig,
}

impl Default for ModelFetcherConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client_config: HttpClientConfig::default(),
        }
    }
}

/// Live model-list fetcher
pub struct ModelFetcher {
    config: ModelFetcherConfig,
    client: Client,
}

impl ModelFetcher {
    pub fn new(config: ModelFetcherConfig) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self { config, client })
    }

    pub async fn fetch_openai_models(&self, api_key: &str, kind: FetchKind) -> Vec<FetchedModel> {
        let is_kind = match kind {
            FetchKind::Chat => is_openai_chat_model,
            FetchKind::Image => is_openai_image_model,
        };

        match self.list_openai(api_key).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|m| is_kind(&m.id) && is_canonical(&m.id))
                .map(|m| FetchedModel {
                    provider: "openai".to_string(),
                    display_name: m.id.clone(),
                    created: m.created.as_ref().and_then(to_timestamp),
                    id: m.id,
                    kind,
                })
                .collect(),
            Err(e) => {
                warn!("Error fetching OpenAI models: {}", e);
                Vec::new()
            }
        }
    }

    /// Anthropic has no image models, so an image fetch is always empty
    pub async fn fetch_anthropic_models(&self, api_key: &str, kind: FetchKind) -> Vec<FetchedModel> {
        if kind == FetchKind::Image {
            return Vec::new();
        }

        match self.list_anthropic(api_key).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|m| is_canonical(&m.id))
                .map(|m| FetchedModel {
                    provider: "anthropic".to_string(),
                    display_name: m
                        .display_name
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| m.id.clone()),
                    created: m.created_at.as_ref().and_then(to_timestamp),
                    id: m.id,
                    kind: FetchKind::Chat,
                })
                .collect(),
            Err(e) => {
                warn!("Error fetching Anthropic models: {}", e);
                Vec::new()
            }
        }
    }

    /// Gemini reports no creation time; results are ordered by
    /// [`gemini_score`], highest first.
    pub async fn fetch_gemini_models(&self, api_key: &str, kind: FetchKind) -> Vec<FetchedModel> {
        let is_kind = match kind {
            FetchKind::Chat => is_gemini_chat_model,
            FetchKind::Image => is_gemini_image_model,
        };

        let list = match self.list_gemini(api_key).await {
            Ok(list) => list,
            Err(e) => {
                warn!("Error fetching Gemini models: {}", e);
                return Vec::new();
            }
        };

        let mut models: Vec<FetchedModel> = list
            .models
            .into_iter()
            .filter_map(|m| {
                let id = strip_models_prefix(&m.name).to_string();
                (is_kind(&id) && is_canonical(&id)).then(|| FetchedModel {
                    provider: "gemini".to_string(),
                    display_name: m
                        .display_name
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| id.clone()),
                    created: None,
                    id,
                    kind,
                })
            })
            .collect();

        models.sort_by(|a, b| gemini_score(&b.id).total_cmp(&gemini_score(&a.id)));
        models
    }

    /// Fetch every provider with a non-empty key concurrently and merge the
    /// results, newest first. Entries without a timestamp keep their relative
    /// order after the dated ones. Providers without a listing here
    /// (`openrouter`) are skipped.
    pub async fn fetch_all_models<'a>(
        &self,
        credentials: impl IntoIterator<Item = (&'a str, &'a str)>,
        kind: FetchKind,
    ) -> Vec<FetchedModel> {
        let fetches = credentials
            .into_iter()
            .filter(|(_, api_key)| !api_key.is_empty())
            .filter_map(|(provider, api_key)| {
                let fetch: futures::future::BoxFuture<'_, Vec<FetchedModel>> = match provider {
                    "openai" => Box::pin(self.fetch_openai_models(api_key, kind)),
                    "anthropic" => Box::pin(self.fetch_anthropic_models(api_key, kind)),
                    "gemini" => Box::pin(self.fetch_gemini_models(api_key, kind)),
                    other => {
                        debug!(provider = other, "No live model listing for provider");
                        return None;
                    }
                };
                Some(fetch)
            })
            .collect::<Vec<_>>();

        let mut models: Vec<FetchedModel> = join_all(fetches).await.into_iter().flatten().collect();
        models.sort_by(|a, b| match (a.created, b.created) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        models
    }

    async fn list_openai(&self, api_key: &str) -> Result<Vec<ListedModel>> {
        let raw = self
            .client
            .get(format!("{}/models", self.config.openai_base_url))
            .bearer_auth(api_key)
            .send()
            .await?
            .handle_vendor_response("OpenAI")
            .await?;
        parse_listing(raw)
    }

    async fn list_anthropic(&self, api_key: &str) -> Result<Vec<ListedModel>> {
        let raw = self
            .client
            .get(format!("{}/v1/models", self.config.anthropic_base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .send()
            .await?
            .handle_vendor_response("Anthropic")
            .await?;
        parse_listing(raw)
    }

    async fn list_gemini(&self, api_key: &str) -> Result<GeminiModelList> {
        let url = Url::parse_with_params(
            &format!("{}/models", self.config.gemini_base_url),
            &[("key", api_key)],
        )
        .map_err(|e| EgressError::ConfigError(format!("Invalid Gemini URL: {}", e)))?;

        let raw = self
            .client
            .get(url)
            .send()
            .await?
            .handle_vendor_response("Gemini")
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| EgressError::ParseError(format!("Failed to parse Gemini model list: {}", e)))
    }
}

/// `data` entry shared by the OpenAI and Anthropic listings
#[derive(Debug, Deserialize)]
struct ListedModel {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    created: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: Vec<ListedModel>,
}

fn parse_listing(raw: Value) -> Result<Vec<ListedModel>> {
    serde_json::from_value::<Listing>(raw)
        .map(|l| l.data)
        .map_err(|e| EgressError::ParseError(format!("Failed to parse model list: {}", e)))
}

/// Epoch milliseconds from a vendor timestamp: numbers are epoch seconds,
/// strings are RFC 3339 dates. Zero and unparseable values yield `None`.
pub fn to_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            (secs != 0.0).then(|| (secs * 1000.0) as i64)
        }
        Value::String(s) if !s.is_empty() => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis()),
        _ => None,
    }
}

pub fn has_date_suffix(id: &str) -> bool {
    DATE_SUFFIX_REGEX.is_match(id)
}

pub fn is_alias(id: &str) -> bool {
    ALIAS_REGEX.is_match(id)
}

/// Neither dated nor an alias
pub fn is_canonical(id: &str) -> bool {
    !has_date_suffix(id) && !is_alias(id)
}

/// `version * 100 + tier + image boost`, tier being pro 3, flash 2, nano 1
pub fn gemini_score(id: &str) -> f64 {
    let version = GEMINI_VERSION_REGEX
        .captures(id)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let lower = id.to_lowercase();
    let tier = if lower.contains("pro") {
        3.0
    } else if lower.contains("flash") {
        2.0
    } else if lower.contains("nano") {
        1.0
    } else {
        0.0
    };
    let image_boost = if IMAGE_REGEX.is_match(id) { 1000.0 } else { 0.0 };

    version * 100.0 + tier + image_boost
}

pub fn is_openai_chat_model(id: &str) -> bool {
    !OPENAI_NON_TEXT_REGEX.is_match(id)
        && !OPENAI_IMAGE_ONLY_REGEX.is_match(id)
        && OPENAI_CHAT_REGEX.is_match(id)
}

pub fn is_openai_image_model(id: &str) -> bool {
    !OPENAI_NON_IMAGE_REGEX.is_match(id) && OPENAI_IMAGE_REGEX.is_match(id)
}

pub fn is_gemini_chat_model(id: &str) -> bool {
    !EMBED_REGEX.is_match(id) && !IMAGE_REGEX.is_match(id) && GEMINI_PREFIX_REGEX.is_match(id)
}

pub fn is_gemini_image_model(id: &str) -> bool {
    !EMBED_REGEX.is_match(id) && GEMINI_PREFIX_REGEX.is_match(id) && IMAGE_REGEX.is_match(id)
}
