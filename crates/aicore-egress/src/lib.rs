//! AI-Core Egress Connectors
//!
//! This crate provides connectors to the LLM vendors:
//! - OpenAI connector (chat completions and responses)
//! - Anthropic connector
//! - Gemini connector
//! - OpenRouter connector
//! - Live model-list fetcher

pub mod anthropic;
pub mod client;
pub mod gemini;
pub mod model_fetcher;
pub mod openai;
pub mod openrouter;

use thiserror::Error;

/// Errors raised while talking to a vendor
#[derive(Debug, Error)]
pub enum EgressError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-2xx status; `message` is the vendor's error text or the generic
    /// "<Vendor> API request failed"
    #[error("{message}")]
    ProviderError {
        vendor: &'static str,
        status_code: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{vendor} API key not configured")]
    NotConfigured { vendor: &'static str },
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for aicore_core::Error {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::NotConfigured { vendor } => aicore_core::Error::NotConfigured {
                vendor: vendor.to_string(),
            },
            EgressError::ProviderError {
                vendor,
                status_code,
                message,
            } => aicore_core::Error::VendorHttp {
                vendor: vendor.to_string(),
                status: status_code,
                message,
            },
            EgressError::HttpError(e) => aicore_core::Error::Transport(e.to_string()),
            EgressError::ParseError(msg) | EgressError::ConfigError(msg) => {
                aicore_core::Error::Transport(msg)
            }
        }
    }
}
