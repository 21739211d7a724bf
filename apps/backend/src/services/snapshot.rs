//! Full-replace JSON snapshots of provider listings.
//!
//! A snapshot is served as-is until a refresh is requested; there is no TTL
//! and no merge. A refresh re-fetches from the provider and overwrites the
//! stored document.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};

/// Snapshot documents kept by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Movies,
    MovieCategories,
    Series,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 3] = [
        SnapshotKind::Movies,
        SnapshotKind::MovieCategories,
        SnapshotKind::Series,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Movies => "movies",
            SnapshotKind::MovieCategories => "movies_categories",
            SnapshotKind::Series => "series",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage backend for snapshot documents.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns the stored bytes, or `None` if no snapshot exists.
    async fn read(&self, kind: SnapshotKind) -> Result<Option<Vec<u8>>>;

    /// Replaces the stored snapshot.
    async fn write(&self, kind: SnapshotKind, bytes: Vec<u8>) -> Result<()>;
}

/// Snapshots stored as `<dir>/<kind>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn read(&self, kind: SnapshotKind) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(kind)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write(&self, kind: SnapshotKind, bytes: Vec<u8>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write next to the target and rename so readers never see a partial file
        let path = self.path(kind);
        let tmp = self.dir.join(format!(".{}.tmp", kind.file_name()));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(kind = %kind, path = %path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

/// In-memory snapshot store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<SnapshotKind, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes performed since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, kind: SnapshotKind) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(&kind))
            .unwrap_or(false)
    }

    /// Stores raw bytes without counting a write, for seeding.
    pub fn insert(&self, kind: SnapshotKind, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(kind, bytes.into());
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn read(&self, kind: SnapshotKind) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AppError::Internal("Snapshot store lock poisoned".to_string()))?;
        Ok(entries.get(&kind).cloned())
    }

    async fn write(&self, kind: SnapshotKind, bytes: Vec<u8>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::Internal("Snapshot store lock poisoned".to_string()))?;
        entries.insert(kind, bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Single-entry memoization per snapshot kind, keyed only by the refresh flag.
///
/// The read or fetch-and-write sequence for a kind runs under that kind's
/// lock, so two concurrent refreshes do not interleave their writes.
pub struct SnapshotCache {
    store: Arc<dyn SnapshotStore>,
    locks: HashMap<SnapshotKind, Mutex<()>>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        let locks = SnapshotKind::ALL
            .iter()
            .map(|kind| (*kind, Mutex::new(())))
            .collect();
        Self { store, locks }
    }

    /// Returns the stored snapshot for `kind`, or fetches, stores and returns
    /// a fresh one when `force_refresh` is set or nothing is stored yet.
    ///
    /// A stored snapshot that does not parse is an error; it is not replaced.
    pub async fn load_or_fetch<T, F, Fut>(
        &self,
        kind: SnapshotKind,
        force_refresh: bool,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let _guard = match self.locks.get(&kind) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        if !force_refresh {
            if let Some(bytes) = self.store.read(kind).await? {
                tracing::debug!(kind = %kind, "Serving snapshot");
                return serde_json::from_slice(&bytes).map_err(|source| {
                    AppError::SnapshotCorrupt {
                        kind: kind.to_string(),
                        source,
                    }
                });
            }
        }

        tracing::info!(kind = %kind, force_refresh, "Fetching fresh snapshot from provider");
        let value = fetch().await?;
        self.write(kind, &value).await?;
        Ok(value)
    }

    /// Serializes `value` and replaces the stored snapshot for `kind`.
    pub async fn store<T: Serialize + Sync>(&self, kind: SnapshotKind, value: &T) -> Result<()> {
        let _guard = match self.locks.get(&kind) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        self.write(kind, value).await
    }

    async fn write<T: Serialize + ?Sized>(&self, kind: SnapshotKind, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize {} snapshot: {}", kind, e)))?;
        self.store.write(kind, bytes).await
    }
}
