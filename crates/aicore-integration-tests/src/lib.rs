//! End-to-end integration tests for AI-Core
//!
//! These helpers wire the facade to a file-backed settings store and to
//! vendor endpoints served by a mock server.

use aicore_core::Result;
use aicore_routing::{AiCore, EndpointConfig, ProviderKind};
use aicore_storage::{FileKeyValueStore, SettingsStore};
use std::path::Path;
use std::sync::Arc;

/// Point every adapter at `uri`. Anthropic appends `/v1/...` itself, the
/// others get a per-vendor prefix so one mock server can serve them all.
pub fn mock_endpoints(uri: &str) -> EndpointConfig {
    EndpointConfig::default()
        .with_base_url(ProviderKind::OpenAI, format!("{}/openai", uri))
        .with_base_url(ProviderKind::Anthropic, uri)
        .with_base_url(ProviderKind::Gemini, format!("{}/gemini", uri))
        .with_base_url(ProviderKind::OpenRouter, format!("{}/openrouter", uri))
}

/// Facade over a [`FileKeyValueStore`] rooted at `data_dir`
pub async fn file_backed_core(data_dir: &Path, endpoints: EndpointConfig) -> Result<AiCore> {
    let kv = FileKeyValueStore::new(data_dir).await?;
    let store = Arc::new(SettingsStore::new(Arc::new(kv)));
    AiCore::new(store, endpoints).await
}

/// Facade over an in-memory store
pub async fn in_memory_core(endpoints: EndpointConfig) -> Result<AiCore> {
    AiCore::new(Arc::new(SettingsStore::in_memory()), endpoints).await
}
