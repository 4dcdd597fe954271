//! File-based KeyValueStore implementation

use async_trait::async_trait;
use futures::stream;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use aicore_core::{
    Error, Result,
    kv_store::{KeyChange, KeyChangeStream, KeyValueStore},
};

use crate::{atomic_writer::write_atomic, memory_store::change_stream};

const FILE_EXTENSION: &str = "json";
const CHANGE_CHANNEL_CAPACITY: usize = 64;
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// File-based key-value store
///
/// Each key is stored as `<key>.json` inside a data directory and replaced
/// atomically on every write. Watching also picks up files rewritten by other
/// processes sharing the directory, so a write made through this store can be
/// reported twice.
#[derive(Debug)]
pub struct FileKeyValueStore {
    data_dir: PathBuf,
    changes: broadcast::Sender<KeyChange>,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a data directory. A leading `~` is
    /// expanded to the home directory.
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = expand_home(&data_dir.into());

        tokio::fs::create_dir_all(&data_dir).await.map_err(|e| {
            error!("Failed to create data directory {:?}: {}", data_dir, e);
            Error::Io(e)
        })?;

        info!("Initialized FileKeyValueStore in {:?}", data_dir);

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { data_dir, changes })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Keys become file names, so only a conservative character set is allowed
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(Error::Storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.data_dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }

    fn notify_change(&self, key: &str) {
        let _ = self.changes.send(KeyChange::now(key));
    }

    /// Spawn a `notify` watcher on the data directory feeding `tx`
    fn spawn_directory_watcher(&self, tx: mpsc::Sender<Result<KeyChange>>) {
        let data_dir = self.data_dir.clone();

        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = match RecommendedWatcher::new(
                move |res: notify::Result<Event>| {
                    if let Err(e) = notify_tx.send(res) {
                        error!("Failed to send file watch event: {}", e);
                    }
                },
                notify::Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    error!("Failed to create file watcher: {}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&data_dir, RecursiveMode::NonRecursive) {
                error!("Failed to watch data directory: {}", e);
                return;
            }

            debug!("Watching data directory for changes: {:?}", data_dir);
            forward_events(&notify_rx, &tx);
            debug!("Stopped watching {:?}", data_dir);
        });
    }
}

fn expand_home(data_dir: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&data_dir.to_string_lossy()).as_ref())
}

/// Relay watcher events into `tx` until the receiving stream is dropped.
/// Returns within one [`WATCH_POLL_INTERVAL`] of the stream going away, even
/// when the directory is quiet.
fn forward_events(
    notify_rx: &std::sync::mpsc::Receiver<notify::Result<Event>>,
    tx: &mpsc::Sender<Result<KeyChange>>,
) {
    loop {
        let event_result = match notify_rx.recv_timeout(WATCH_POLL_INTERVAL) {
            Ok(event_result) => event_result,
            Err(RecvTimeoutError::Timeout) => {
                if tx.is_closed() {
                    debug!("Key change stream closed, stopping watcher");
                    return;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        };

        match event_result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    continue;
                }

                for key in event.paths.iter().filter_map(|p| key_for_path(p)) {
                    if tx.blocking_send(Ok(KeyChange::now(key))).is_err() {
                        debug!("Key change stream closed, stopping watcher");
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("File watch error: {}", e);
                if tx
                    .blocking_send(Err(Error::Storage(format!("File watch error: {}", e))))
                    .is_err()
                {
                    return;
                }
            }
        }
    }
}

/// `<key>.json` maps back to `key`; temp files and other files are ignored
fn key_for_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read {:?}: {}", path, e);
                Err(Error::Io(e))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let data = value.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || write_atomic(&path, &data))
            .await
            .map_err(|e| Error::Storage(format!("Write task failed: {}", e)))??;

        debug!(key, "Stored value");
        self.notify_change(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.notify_change(key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn watch(&self) -> Result<KeyChangeStream<'_>> {
        let (tx, rx) = mpsc::channel(100);
        self.spawn_directory_watcher(tx);

        let external = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let local = change_stream(self.changes.subscribe());

        Ok(Box::pin(stream::select(local, external)))
    }
}
