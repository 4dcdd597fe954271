//! Shared HTTP client utilities

use crate::{EgressError, Result};
use aicore_core::{normaliser, normalized::NormalisedResponse};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Request timeout in seconds. Reasoning models can think for minutes
    /// before the first byte arrives.
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
            user_agent: format!("AICore/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_connect_timeout_secs(mut self, connect_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Create a configured HTTP client with connection pooling
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before vendors close them
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| EgressError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

// Response handling trait extension

#[async_trait]
pub(crate) trait VendorResponseExt {
    /// Decode a success body as JSON, or turn a failure status into
    /// [`EgressError::ProviderError`] carrying the vendor's own message.
    async fn handle_vendor_response(self, vendor: &'static str) -> Result<Value>;
}

#[async_trait]
impl VendorResponseExt for reqwest::Response {
    async fn handle_vendor_response(self, vendor: &'static str) -> Result<Value> {
        let status = self.status();
        debug!(vendor, "Response status: {}", status);

        if !status.is_success() {
            let body = self.text().await.unwrap_or_default();
            return Err(EgressError::ProviderError {
                vendor,
                status_code: status.as_u16(),
                message: vendor_error_message(vendor, &body),
            });
        }

        let raw = self
            .json::<Value>()
            .await
            .map_err(|e| EgressError::ParseError(format!("Failed to parse {} response: {}", vendor, e)))?;

        // OpenRouter reports some failures as a 200 with an `error` body
        if normaliser::has_error(&raw) {
            return Err(EgressError::ProviderError {
                vendor,
                status_code: status.as_u16(),
                message: error_message_from_body(vendor, &raw),
            });
        }

        Ok(raw)
    }
}

/// Reject the placeholder the normaliser builds for a body without a usable
/// choice.
pub(crate) fn require_choices(
    vendor: &'static str,
    response: NormalisedResponse,
) -> Result<NormalisedResponse> {
    if response.is_error() {
        return Err(EgressError::ParseError(format!(
            "{} response contained no usable choice",
            vendor
        )));
    }
    Ok(response)
}

/// The vendor's `error` text from a failure body, or the generic fallback
/// when the body is not JSON or carries no usable message.
pub(crate) fn vendor_error_message(vendor: &str, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(raw) => error_message_from_body(vendor, &raw),
        Err(_) => format!("{} API request failed", vendor),
    }
}

fn error_message_from_body(vendor: &str, raw: &Value) -> String {
    let message = normaliser::extract_error(raw);

    if message.is_empty() || message == "Unknown error" {
        format!("{} API request failed", vendor)
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(config.user_agent.starts_with("AICore/"));
    }

    #[test]
    fn test_create_client() {
        let config = HttpClientConfig::default().with_timeout_secs(5);
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_vendor_error_message_from_body() {
        let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error"}}"#;
        assert_eq!(vendor_error_message("OpenAI", body), "Invalid API key");

        let body = r#"{"error":"quota exceeded"}"#;
        assert_eq!(vendor_error_message("OpenRouter", body), "quota exceeded");
    }

    #[test]
    fn test_vendor_error_message_fallback() {
        assert_eq!(
            vendor_error_message("Anthropic", "<html>502 Bad Gateway</html>"),
            "Anthropic API request failed"
        );
        assert_eq!(
            vendor_error_message("Gemini", r#"{"error":{"code":500}}"#),
            "Gemini API request failed"
        );
        assert_eq!(vendor_error_message("OpenAI", ""), "OpenAI API request failed");
    }

    #[test]
    fn test_require_choices() {
        let placeholder = normaliser::create_error_response("no choices", "gpt-4o");
        let err = require_choices("OpenAI", placeholder).unwrap_err();
        assert!(matches!(err, EgressError::ParseError(_)));
        assert_eq!(
            err.to_string(),
            "Parse error: OpenAI response contained no usable choice"
        );

        let response = normaliser::normalise_anthropic(&serde_json::json!({
            "content": [{"text": "Hi"}]
        }));
        assert_eq!(require_choices("Anthropic", response).unwrap().content(), "Hi");
    }
}
