//! `AiCore`: the entry point applications talk to
//!
//! The facade owns one adapter per provider, the model registry and an
//! in-memory snapshot of the persisted settings. It is constructed once at
//! startup and shared by reference (typically behind an `Arc`).

use aicore_core::{
    Error, Result, normaliser,
    normalized::{Message, NormalisedResponse, RequestOptions, Usage},
    provider::{Provider, ProviderStatus},
    registry::ModelRegistry,
    settings::{AISettings, ProviderConfigUpdate, SettingsUpdate},
    stats::UsageStats,
};
use aicore_egress::model_fetcher::{FetchKind, FetchedModel, ModelFetcher};
use aicore_storage::SettingsStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    provider_config::EndpointConfig,
    provider_registry::{ProviderRegistry, infer_provider},
};

/// App id recorded in usage stats when the caller names none
pub const DEFAULT_APP_ID: &str = "unknown";

/// Provider-agnostic facade over the four vendor adapters
pub struct AiCore {
    providers: ProviderRegistry,
    models: Arc<ModelRegistry>,
    store: Arc<SettingsStore>,
    settings: RwLock<AISettings>,
    fetcher: ModelFetcher,
}

impl AiCore {
    /// Load settings from `store` and build every adapter against `endpoints`
    pub async fn new(store: Arc<SettingsStore>, endpoints: EndpointConfig) -> Result<Self> {
        let settings = store.load_settings().await?;
        let providers = ProviderRegistry::from_settings(&settings, &endpoints)?;
        Self::assemble(store, providers, settings, &endpoints)
    }

    /// Like [`AiCore::new`] with a caller-supplied adapter set
    pub async fn with_providers(
        store: Arc<SettingsStore>,
        providers: ProviderRegistry,
        endpoints: EndpointConfig,
    ) -> Result<Self> {
        let settings = store.load_settings().await?;
        Self::assemble(store, providers, settings, &endpoints)
    }

    fn assemble(
        store: Arc<SettingsStore>,
        providers: ProviderRegistry,
        settings: AISettings,
        endpoints: &EndpointConfig,
    ) -> Result<Self> {
        let fetcher = ModelFetcher::new(endpoints.model_fetcher_config())?;
        let core = Self {
            providers,
            models: Arc::new(ModelRegistry::new()),
            store,
            settings: RwLock::new(settings),
            fetcher,
        };
        info!(
            providers = ?core.providers.names(),
            configured = ?core.configured_providers(),
            "AI-Core initialized"
        );
        Ok(core)
    }

    /// True when at least one adapter holds a key
    pub fn is_configured(&self) -> bool {
        !self.configured_providers().is_empty()
    }

    pub fn configured_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|(_, provider)| provider.is_configured())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Resolve the adapter serving `model`: the registry's provider when the
    /// model is registered, otherwise one inferred from the id.
    pub fn get_provider_for_model(&self, model: &str) -> Result<Arc<dyn Provider>> {
        let provider_name = match self.models.get_provider(model) {
            Some(name) => name,
            None => infer_provider(model)
                .ok_or_else(|| Error::UnknownModel(model.to_string()))?
                .name()
                .to_string(),
        };

        let provider = self
            .providers
            .get(&provider_name)
            .ok_or_else(|| Error::ProviderNotInitialised(provider_name.clone()))?;

        if !provider.is_configured() {
            return Err(Error::ProviderNotConfigured(provider_name));
        }

        Ok(provider.clone())
    }

    /// Send a chat request to whichever provider serves `model`
    ///
    /// `max_tokens` defaults to 2000 and `temperature` to 0.7. When stats are
    /// enabled the request is recorded against `app_id` (default
    /// [`DEFAULT_APP_ID`]).
    #[instrument(skip(self, messages, options), fields(app_id = app_id.unwrap_or(DEFAULT_APP_ID)))]
    pub async fn send_text_request(
        &self,
        model: &str,
        messages: &[Message],
        options: RequestOptions,
        app_id: Option<&str>,
    ) -> Result<NormalisedResponse> {
        let provider = self.get_provider_for_model(model)?;
        let options = options.resolved_for(model);
        debug!(provider = provider.name(), "Dispatching request");

        let response = match provider.send_request(messages, &options).await {
            Ok(response) => response,
            Err(e) => {
                error!(provider = provider.name(), model, "Request failed: {}", e);
                return Err(e);
            }
        };

        // Placeholders from third-party providers carry no real usage
        if response.is_error() {
            warn!(provider = provider.name(), model, "Provider returned an error placeholder");
        } else if self.settings.read().await.enable_stats {
            self.track_usage(
                provider.name(),
                model,
                app_id.unwrap_or(DEFAULT_APP_ID),
                &response.usage,
            )
            .await;
        }

        Ok(response)
    }

    /// Failing to persist stats never fails the request
    async fn track_usage(&self, provider: &str, model: &str, app_id: &str, usage: &Usage) {
        let cost = self
            .models
            .calculate_cost(model, usage.prompt_tokens, usage.completion_tokens);

        if let Err(e) = self
            .store
            .record_usage(provider, model, app_id, u64::from(usage.total_tokens), cost)
            .await
        {
            warn!(provider, model, "Failed to record usage stats: {}", e);
        }
    }

    /// Send to the settings' default model
    pub async fn chat(
        &self,
        messages: &[Message],
        options: RequestOptions,
    ) -> Result<NormalisedResponse> {
        let model = self.settings.read().await.chat_model().to_string();
        self.send_text_request(&model, messages, options, None).await
    }

    fn provider(&self, name: &str) -> Result<&Arc<dyn Provider>> {
        self.providers
            .get(name)
            .ok_or_else(|| Error::ProviderNotFound(name.to_string()))
    }

    /// Re-key the live adapter and persist the key. A non-empty key enables
    /// the provider, an empty one disables it.
    pub async fn set_api_key(&self, provider: &str, api_key: &str) -> Result<()> {
        let adapter = self.provider(provider)?;
        adapter.set_api_key(api_key);

        self.store
            .update_provider(provider, ProviderConfigUpdate::api_key(api_key))
            .await?;

        *self.settings.write().await = self.store.load_settings().await?;
        info!(provider, configured = adapter.is_configured(), "API key updated");
        Ok(())
    }

    pub async fn test_api_key(&self, provider: &str) -> Result<bool> {
        Ok(self.provider(provider)?.test_api_key().await)
    }

    /// Live model ids for one provider, `[]` when it has no key
    pub async fn get_available_models(&self, provider: &str) -> Result<Vec<String>> {
        let adapter = self.provider(provider)?;
        if !adapter.is_configured() {
            return Ok(Vec::new());
        }
        Ok(adapter.available_models().await)
    }

    /// Every registered model id
    pub fn get_all_models(&self) -> Vec<String> {
        self.models
            .get_all_models()
            .into_iter()
            .map(|m| m.id)
            .collect()
    }

    pub fn get_models_by_provider(&self, provider: &str) -> Vec<String> {
        self.models
            .get_models_by_provider(provider)
            .into_iter()
            .map(|m| m.id)
            .collect()
    }

    /// Configured flag and masked key per provider
    pub fn get_provider_status(&self) -> BTreeMap<String, ProviderStatus> {
        self.providers
            .iter()
            .map(|(name, provider)| {
                (
                    name.to_string(),
                    ProviderStatus {
                        configured: provider.is_configured(),
                        api_key: provider.api_key(),
                    },
                )
            })
            .collect()
    }

    /// Snapshot of the current settings
    pub async fn get_settings(&self) -> AISettings {
        self.settings.read().await.clone()
    }

    /// Shallow-merge `update` into the in-memory settings and persist them
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<AISettings> {
        let mut settings = self.settings.write().await;
        update.apply(&mut *settings);
        self.store.save_settings(&settings).await?;
        Ok(settings.clone())
    }

    /// Reload settings from the store and push the stored keys to the
    /// adapters, picking up changes written by another process
    pub async fn reload_settings(&self) -> Result<AISettings> {
        let settings = self.store.load_settings().await?;
        for (name, provider) in self.providers.iter() {
            if let Some(config) = settings.provider(name) {
                provider.set_api_key(&config.api_key);
            }
        }
        *self.settings.write().await = settings.clone();
        debug!("Settings reloaded");
        Ok(settings)
    }

    pub async fn get_stats(&self) -> Result<UsageStats> {
        self.store.load_stats().await
    }

    pub async fn reset_stats(&self) -> Result<UsageStats> {
        self.store.reset_stats().await
    }

    /// Query the vendors' live model listings for every provider holding a
    /// key in settings
    pub async fn fetch_live_models(&self, kind: FetchKind) -> Vec<FetchedModel> {
        let credentials: Vec<(String, String)> = self
            .settings
            .read()
            .await
            .providers
            .values()
            .map(|p| (p.name.clone(), p.api_key.clone()))
            .collect();

        self.fetcher
            .fetch_all_models(
                credentials
                    .iter()
                    .map(|(name, key)| (name.as_str(), key.as_str())),
                kind,
            )
            .await
    }

    /// Shared model registry, for registering models discovered at runtime
    pub fn model_registry(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    /// Notified every time settings are saved
    pub fn subscribe_settings(&self) -> broadcast::Receiver<AISettings> {
        self.store.subscribe()
    }

    pub fn extract_content(response: &NormalisedResponse) -> String {
        normaliser::extract_content(response)
    }

    pub fn extract_usage(response: &NormalisedResponse) -> Usage {
        normaliser::extract_usage(response)
    }
}
