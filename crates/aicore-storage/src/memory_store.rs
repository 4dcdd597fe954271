//! In-memory KeyValueStore implementation

use aicore_core::{
    Result,
    kv_store::{KeyChange, KeyChangeStream, KeyValueStore},
};
use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};
use tracing::warn;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Process-local key-value store
///
/// Nothing survives the process; intended for tests and for hosts that
/// persist elsewhere.
#[derive(Debug)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<KeyChange>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        // No receivers is fine
        let _ = self.changes.send(KeyChange::now(key));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.entries.write().await.remove(key).is_some() {
            let _ = self.changes.send(KeyChange::now(key));
        }
        Ok(())
    }

    async fn watch(&self) -> Result<KeyChangeStream<'_>> {
        Ok(Box::pin(change_stream(self.changes.subscribe())))
    }
}

/// Turn a broadcast receiver into a change stream. A lagging receiver skips
/// the missed notifications and keeps going.
pub(crate) fn change_stream(
    rx: broadcast::Receiver<KeyChange>,
) -> impl Stream<Item = Result<KeyChange>> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => return Some((Ok(change), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Key change watcher lagged, skipped {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}
