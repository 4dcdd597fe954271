//! Provider trait definitions

use crate::{
    Result,
    normalized::{Message, NormalisedResponse, RequestOptions},
};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// Uniform contract implemented by every vendor adapter.
///
/// Credentials are held behind interior mutability so a shared
/// `Arc<dyn Provider>` can be re-keyed at runtime.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name used as registry key (`openai`, `anthropic`, ...)
    fn name(&self) -> &'static str;

    /// Replace the credential in memory. No I/O.
    fn set_api_key(&self, api_key: &str);

    /// Masked form of the current credential, see [`mask_api_key`]
    fn api_key(&self) -> String;

    /// True iff a non-empty credential is set
    fn is_configured(&self) -> bool;

    /// Send a chat request and return the normalised response
    async fn send_request(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<NormalisedResponse>;

    /// Send a minimal request; any failure counts as `false`
    async fn test_api_key(&self) -> bool;

    /// Model ids available to this credential, `[]` when unconfigured
    async fn available_models(&self) -> Vec<String>;

    /// Get provider capabilities
    fn capabilities(&self) -> ProviderCapabilities;
}

#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    pub supports_streaming: bool,
    pub supports_images: bool,
}

/// Per-provider status reported to admin surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub configured: bool,
    /// Masked credential, never the raw key
    pub api_key: String,
}

/// Credential holder shared by the adapters
#[derive(Debug, Default)]
pub struct ApiKeySlot {
    key: RwLock<String>,
}

impl ApiKeySlot {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            key: RwLock::new(api_key.into()),
        }
    }

    pub fn set(&self, api_key: &str) {
        let mut key = self.key.write().unwrap_or_else(PoisonError::into_inner);
        *key = api_key.to_string();
    }

    /// Raw credential, for building outgoing requests only
    pub fn expose(&self) -> String {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn masked(&self) -> String {
        mask_api_key(&self.key.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_set(&self) -> bool {
        !self
            .key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

const MASK_HEAD: usize = 7;
const MASK_TAIL: usize = 4;

/// Mask a credential as `first7...last4`.
///
/// Empty keys mask to an empty string. Keys shorter than 11 characters mask to
/// `***` so that head and tail never overlap into the full key.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() < MASK_HEAD + MASK_TAIL {
        return "***".to_string();
    }

    let head: String = chars[..MASK_HEAD].iter().collect();
    let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
    format!("{head}...{tail}")
}

/// Send a one-word probe through `provider` and report whether a real
/// choice came back. A normaliser placeholder counts as a failure.
pub async fn probe_api_key(provider: &dyn Provider, model: &str, max_tokens: u32) -> bool {
    let options = RequestOptions::new(model).with_max_tokens(max_tokens);
    match provider
        .send_request(&[Message::user("Hello")], &options)
        .await
    {
        Ok(response) => !response.choices.is_empty() && !response.is_error(),
        Err(e) => {
            warn!(provider = provider.name(), "API key test failed: {}", e);
            false
        }
    }
}
