//! Persistence for AI-Core settings and usage statistics
//!
//! This crate provides the [`SettingsStore`], which keeps the settings and
//! stats blobs behind the `KeyValueStore` port, plus two implementations of
//! that port.
//!
//! # Features
//! - Versioned settings with reset-to-default migration
//! - Usage-stat accumulation with read-modify-write serialised per store
//! - "Settings saved" broadcast for in-process listeners
//! - In-memory store for tests and ephemeral use
//! - File store with atomic writes and external-change watching via `notify`
//!
//! # Example
//! ```no_run
//! # use aicore_storage::{FileKeyValueStore, SettingsStore};
//! # use std::sync::Arc;
//! # async fn example() -> aicore_core::Result<()> {
//! let kv = FileKeyValueStore::new("~/.aicore").await?;
//! let store = SettingsStore::new(Arc::new(kv));
//! let settings = store.load_settings().await?;
//! # Ok(())
//! # }
//! ```

pub mod atomic_writer;
mod file_store;
mod memory_store;
mod settings_store;

pub use file_store::FileKeyValueStore;
pub use memory_store::InMemoryKeyValueStore;
pub use settings_store::SettingsStore;
