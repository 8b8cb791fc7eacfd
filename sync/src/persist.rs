//! Durable local persistence.
//!
//! The engine defines the blob format; this module only decides where
//! the blob lives. [`FileStore`] writes through a temp file so a crash
//! mid-write never leaves a torn blob behind.

use crate::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tirelire_engine::model::AppState;
use tirelire_engine::storage;

/// Where the serialized state blob is kept between runs.
pub trait LocalStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, blob: &str) -> Result<()>;
}

/// Blob stored as a JSON file in an application data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(format!("{}.json", storage::STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    blob: Mutex<Option<String>>,
    save_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.lock().expect("blob lock").clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        *self.blob.lock().expect("blob lock") = Some(blob.to_string());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Load the persisted state, or a fresh default on first run.
pub fn load_initial_state(store: &dyn LocalStore) -> Result<AppState> {
    match store.load()? {
        Some(blob) => Ok(storage::load_state(&blob)?),
        None => Ok(AppState::default()),
    }
}

/// Serialize and save the state.
pub fn persist_state(store: &dyn LocalStore, state: &AppState) -> Result<()> {
    store.save(&storage::save_state(state)?)
}
