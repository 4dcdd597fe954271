//! Integration test: settings and stats survive a restart of the facade

use aicore_core::{kv_store::KeyValueStore, settings::SettingsUpdate, stats::UsageStats};
use aicore_integration_tests::file_backed_core;
use aicore_routing::EndpointConfig;
use aicore_storage::FileKeyValueStore;
use futures::StreamExt;
use std::time::Duration;

#[tokio::test]
async fn test_api_key_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();

    {
        let core = file_backed_core(dir.path(), EndpointConfig::default())
            .await
            .unwrap();
        core.set_api_key("openai", "sk-test1234567890").await.unwrap();

        let status = core.get_provider_status();
        assert!(status["openai"].configured);
        assert_eq!(status["openai"].api_key, "sk-test...7890");
    }

    assert!(dir.path().join("smashingapps_ai_core_settings.json").exists());

    let reloaded = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();
    let status = reloaded.get_provider_status();

    assert!(status["openai"].configured);
    assert_eq!(status["openai"].api_key, "sk-test...7890");
    assert!(!status["anthropic"].configured);
    assert_eq!(reloaded.configured_providers(), vec!["openai"]);

    let settings = reloaded.get_settings().await;
    assert!(settings.providers["openai"].enabled);
}

#[tokio::test]
async fn test_general_settings_persist() {
    let dir = tempfile::tempdir().unwrap();

    let core = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();
    core.update_settings(SettingsUpdate {
        default_model: Some("claude-3-5-haiku-20241022".to_string()),
        enable_stats: Some(false),
        ..SettingsUpdate::default()
    })
    .await
    .unwrap();
    drop(core);

    let reloaded = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();
    let settings = reloaded.get_settings().await;

    assert_eq!(settings.default_model, "claude-3-5-haiku-20241022");
    assert!(!settings.enable_stats);
    assert_eq!(settings.default_provider, "openai");
}

#[tokio::test]
async fn test_reset_stats_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let core = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();

    let first = core.reset_stats().await.unwrap();
    let second = core.reset_stats().await.unwrap();

    assert_eq!(first.total_requests, 0);
    assert!(first.by_provider.is_empty());
    assert!(first.by_model.is_empty());
    assert!(first.by_app.is_empty());
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

    let stored = core.get_stats().await.unwrap();
    assert!(stored.is_empty());
    assert_eq!(stored.last_reset, second.last_reset);
}

#[tokio::test]
async fn test_reload_picks_up_external_key_change() {
    let dir = tempfile::tempdir().unwrap();

    let core = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();
    let other = file_backed_core(dir.path(), EndpointConfig::default())
        .await
        .unwrap();

    other
        .set_api_key("anthropic", "sk-ant-REDACTED")
        .await
        .unwrap();
    assert!(!core.get_provider_status()["anthropic"].configured);

    core.reload_settings().await.unwrap();
    assert!(core.get_provider_status()["anthropic"].configured);
}

#[tokio::test]
async fn test_file_store_reports_writes_from_another_instance() {
    let dir = tempfile::tempdir().unwrap();

    let watcher = FileKeyValueStore::new(dir.path()).await.unwrap();
    let writer = FileKeyValueStore::new(dir.path()).await.unwrap();
    let mut changes = watcher.watch().await.unwrap();

    // The directory watcher starts in the background, so keep writing until
    // it reports the key
    let seen = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            writer.set("smashingapps_ai_core_stats", "{}").await.unwrap();
            let next = tokio::time::timeout(Duration::from_millis(200), changes.next()).await;
            if let Ok(Some(Ok(change))) = next {
                if change.key == "smashingapps_ai_core_stats" {
                    return true;
                }
            }
        }
    })
    .await
    .unwrap_or(false);

    assert!(seen);
    assert_eq!(
        watcher.get("smashingapps_ai_core_stats").await.unwrap().as_deref(),
        Some("{}")
    );
}
