//! Key-value persistence port
//!
//! The `KeyValueStore` trait is the only persistence seam of AI-Core. Settings
//! and usage stats are stored as whole JSON blobs under fixed keys, so the
//! port needs nothing richer than get/set/remove plus change notification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::Result;

/// Type alias for key change streams
pub type KeyChangeStream<'a> = BoxStream<'a, Result<KeyChange>>;

/// Change notification for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    /// Key whose value changed
    pub key: String,

    /// When the change was observed
    pub timestamp: DateTime<Utc>,
}

impl KeyChange {
    pub fn now(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Key-value store trait
///
/// Implementations:
/// - `InMemoryKeyValueStore`: process-local map, for tests and ephemeral use
/// - `FileKeyValueStore`: one JSON file per key in a data directory
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Watch for changes
    ///
    /// The stream emits after every `set`/`remove` made through this store.
    /// File-backed stores additionally report writes made by other processes.
    async fn watch(&self) -> Result<KeyChangeStream<'_>>;
}
