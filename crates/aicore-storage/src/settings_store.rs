//! Settings and usage-stats persistence over a `KeyValueStore`

use aicore_core::{
    Error, Result,
    kv_store::KeyValueStore,
    settings::{
        AISettings, ProviderConfig, ProviderConfigUpdate, SETTINGS_KEY, SETTINGS_VERSION,
        STATS_KEY,
    },
    stats::UsageStats,
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

use crate::InMemoryKeyValueStore;

const SETTINGS_CHANNEL_CAPACITY: usize = 16;

/// Settings and stats persistence
///
/// Both blobs are read, mutated and written back whole. Read-modify-write
/// cycles going through one `SettingsStore` are serialised; writers in other
/// processes sharing the backing store can still overwrite each other.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    saved: broadcast::Sender<AISettings>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (saved, _) = broadcast::channel(SETTINGS_CHANNEL_CAPACITY);
        Self {
            store,
            write_lock: Mutex::new(()),
            saved,
        }
    }

    /// Store backed by a fresh [`InMemoryKeyValueStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    /// Backing key-value store
    pub fn backing_store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Receives a copy of the settings every time they are saved
    pub fn subscribe(&self) -> broadcast::Receiver<AISettings> {
        self.saved.subscribe()
    }

    /// Load settings. A missing or unreadable blob yields defaults, and a blob
    /// from another schema version is replaced by defaults.
    pub async fn load_settings(&self) -> Result<AISettings> {
        let Some(stored) = self.store.get(SETTINGS_KEY).await? else {
            debug!("No stored settings, using defaults");
            return Ok(AISettings::default());
        };

        let settings: AISettings = match serde_json::from_str(&stored) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Error loading settings, using defaults: {}", e);
                return Ok(AISettings::default());
            }
        };

        if settings.version != SETTINGS_VERSION {
            return Ok(migrate_settings(settings));
        }

        Ok(settings)
    }

    /// Stamp the current version, persist, and notify subscribers
    pub async fn save_settings(&self, settings: &AISettings) -> Result<()> {
        let mut settings = settings.clone();
        settings.version = SETTINGS_VERSION;

        let json = serde_json::to_string(&settings)?;
        self.store.set(SETTINGS_KEY, &json).await.map_err(|e| {
            error!("Error saving settings: {}", e);
            Error::Storage(format!("Failed to save settings: {}", e))
        })?;

        // No subscribers is fine
        let _ = self.saved.send(settings);
        Ok(())
    }

    /// Merge `update` into one provider's configuration
    pub async fn update_provider(
        &self,
        provider: &str,
        update: ProviderConfigUpdate,
    ) -> Result<AISettings> {
        let _guard = self.write_lock.lock().await;

        let mut settings = self.load_settings().await?;
        let config = settings
            .providers
            .get_mut(provider)
            .ok_or_else(|| Error::ProviderNotFound(provider.to_string()))?;
        update.apply(config);

        self.save_settings(&settings).await?;
        info!(provider, "Updated provider configuration");
        Ok(settings)
    }

    pub async fn get_provider(&self, provider: &str) -> Result<Option<ProviderConfig>> {
        Ok(self.load_settings().await?.providers.remove(provider))
    }

    /// Providers that are enabled and hold a non-empty key
    pub async fn configured_providers(&self) -> Result<Vec<String>> {
        Ok(self.load_settings().await?.configured_providers())
    }

    /// Load stats. A missing or unreadable blob yields zeroed stats stamped
    /// with the current time.
    pub async fn load_stats(&self) -> Result<UsageStats> {
        let Some(stored) = self.store.get(STATS_KEY).await? else {
            return Ok(UsageStats::reset_now());
        };

        match serde_json::from_str(&stored) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                error!("Error loading stats, starting from zero: {}", e);
                Ok(UsageStats::reset_now())
            }
        }
    }

    pub async fn save_stats(&self, stats: &UsageStats) -> Result<()> {
        let json = serde_json::to_string(stats)?;
        self.store.set(STATS_KEY, &json).await
    }

    /// Add one request to the persisted stats
    pub async fn record_usage(
        &self,
        provider: &str,
        model: &str,
        app_id: &str,
        tokens: u64,
        cost: f64,
    ) -> Result<UsageStats> {
        let _guard = self.write_lock.lock().await;

        let mut stats = self.load_stats().await?;
        stats.record(provider, model, app_id, tokens, cost);
        self.save_stats(&stats).await?;

        debug!(provider, model, app_id, tokens, cost, "Recorded usage");
        Ok(stats)
    }

    /// Replace the stats with zeroed counters
    pub async fn reset_stats(&self) -> Result<UsageStats> {
        let _guard = self.write_lock.lock().await;

        let stats = UsageStats::reset_now();
        self.save_stats(&stats).await?;
        info!("Usage stats reset");
        Ok(stats)
    }
}

/// No field-level migration exists yet: any other version resets to defaults
fn migrate_settings(old: AISettings) -> AISettings {
    warn!(
        from = old.version,
        to = SETTINGS_VERSION,
        "Migrating settings from old version"
    );
    AISettings::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_defaults_when_missing() {
        let store = SettingsStore::in_memory();
        let settings = store.load_settings().await.unwrap();

        assert_eq!(settings, AISettings::default());
        assert!(store.configured_providers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_settings_fall_back_to_defaults() {
        let store = SettingsStore::in_memory();
        store
            .backing_store()
            .set(SETTINGS_KEY, "{not json")
            .await
            .unwrap();

        assert_eq!(store.load_settings().await.unwrap(), AISettings::default());
    }

    #[tokio::test]
    async fn test_version_mismatch_migrates_to_defaults() {
        let store = SettingsStore::in_memory();
        let mut old = serde_json::to_value(AISettings::default()).unwrap();
        old["version"] = json!(0);
        old["defaultModel"] = json!("gpt-4");
        store
            .backing_store()
            .set(SETTINGS_KEY, &old.to_string())
            .await
            .unwrap();

        let settings = store.load_settings().await.unwrap();
        assert_eq!(settings.default_model, "gpt-4o-mini");
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[tokio::test]
    async fn test_save_stamps_version_and_broadcasts() {
        let store = SettingsStore::in_memory();
        let mut rx = store.subscribe();

        let mut settings = AISettings::default();
        settings.version = 42;
        settings.default_model = "claude-3-haiku-20240307".to_string();
        store.save_settings(&settings).await.unwrap();

        let broadcast = rx.recv().await.unwrap();
        assert_eq!(broadcast.version, SETTINGS_VERSION);
        assert_eq!(broadcast.default_model, "claude-3-haiku-20240307");

        let loaded = store.load_settings().await.unwrap();
        assert_eq!(loaded.default_model, "claude-3-haiku-20240307");
    }

    #[tokio::test]
    async fn test_update_provider() {
        let store = SettingsStore::in_memory();

        store
            .update_provider("anthropic", ProviderConfigUpdate::api_key("sk-ant-api03-abc"))
            .await
            .unwrap();

        let provider = store.get_provider("anthropic").await.unwrap().unwrap();
        assert!(provider.enabled);
        assert_eq!(provider.api_key, "sk-ant-api03-abc");
        assert_eq!(provider.display_name, "Anthropic Claude");
        assert_eq!(store.configured_providers().await.unwrap(), vec!["anthropic"]);

        // Clearing the key disables the provider again
        store
            .update_provider("anthropic", ProviderConfigUpdate::api_key(""))
            .await
            .unwrap();
        assert!(store.configured_providers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_provider() {
        let store = SettingsStore::in_memory();

        let err = store
            .update_provider("mistral", ProviderConfigUpdate::api_key("k"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Provider mistral not found");
        assert!(store.get_provider("mistral").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_usage_accumulates() {
        let store = SettingsStore::in_memory();

        store
            .record_usage("openai", "gpt-4o", "article-smasher", 100, 0.002)
            .await
            .unwrap();
        let stats = store
            .record_usage("anthropic", "claude-3-haiku-20240307", "article-smasher", 50, 0.001)
            .await
            .unwrap();

        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_tokens, 150);
        assert_eq!(stats.by_app["article-smasher"].requests, 2);
        assert_eq!(stats.by_provider["openai"].tokens, 100);
        assert_eq!(store.load_stats().await.unwrap(), stats);
    }

    #[tokio::test]
    async fn test_concurrent_record_usage_loses_nothing() {
        let store = Arc::new(SettingsStore::in_memory());

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .record_usage("openai", "gpt-4o-mini", "unknown", 10, 0.0)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let stats = store.load_stats().await.unwrap();
        assert_eq!(stats.total_requests, 20);
        assert_eq!(stats.total_tokens, 200);
    }

    #[tokio::test]
    async fn test_reset_stats_idempotent() {
        let store = SettingsStore::in_memory();
        store
            .record_usage("gemini", "gemini-1.5-flash", "unknown", 10, 0.0)
            .await
            .unwrap();

        let first = store.reset_stats().await.unwrap();
        let second = store.reset_stats().await.unwrap();

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(
            UsageStats {
                last_reset: None,
                ..first
            },
            UsageStats {
                last_reset: None,
                ..second
            }
        );
        assert!(store.load_stats().await.unwrap().last_reset.is_some());
    }

    #[tokio::test]
    async fn test_missing_stats_are_zeroed() {
        let store = SettingsStore::in_memory();
        let stats = store.load_stats().await.unwrap();

        assert!(stats.is_empty());
        assert!(stats.last_reset.is_some());
    }
}
