//! Count store adapters.
//!
//! The detector persists its running total through the [`CountStore`]
//! boundary: one `load` when it is constructed and one `save` after every
//! accepted step and every reset. Persistence is best-effort. The in-memory
//! total is authoritative for the session, so callers log store failures and
//! move on.
//!
//! Implementations:
//! - [`MemoryStore`]: shared in-process slot
//! - [`FileStore`]: one named slot inside a JSON key-value document
//! - [`BackgroundStore`]: moves saves of any store onto a writer thread
//! - [`NullStore`]: persistence disabled

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Default name of the persisted slot.
pub const DEFAULT_COUNT_KEY: &str = "stepCount";

/// Boundary to durable storage of the running step count.
pub trait CountStore: Send + Sync {
    /// Returns the previously persisted count, or `None` if nothing was saved.
    fn load(&self) -> Result<Option<u64>, StoreError>;

    /// Persists `count`, replacing whatever was stored before.
    fn save(&self, count: u64) -> Result<(), StoreError>;
}

impl<S: CountStore + ?Sized> CountStore for Arc<S> {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        (**self).load()
    }

    fn save(&self, count: u64) -> Result<(), StoreError> {
        (**self).save(count)
    }
}

impl<S: CountStore + ?Sized> CountStore for Box<S> {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        (**self).load()
    }

    fn save(&self, count: u64) -> Result<(), StoreError> {
        (**self).save(count)
    }
}

/// A store that never persists anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl CountStore for NullStore {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }

    fn save(&self, _count: u64) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process count slot.
///
/// Clones share the same slot, so a test or host can keep a handle and
/// observe what the detector wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<u64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `count`.
    pub fn with_count(count: u64) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(count))),
        }
    }

    /// The currently stored value.
    pub fn get(&self) -> Option<u64> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CountStore for MemoryStore {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.get())
    }

    fn save(&self, count: u64) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(count);
        Ok(())
    }
}

/// File-backed store holding the count in one named slot of a JSON object.
///
/// The slot value is the decimal text of the count (`{"stepCount": "42"}`).
/// Plain JSON integers are accepted on load. Other keys in the document are
/// left untouched on save. Writes go to a sibling temporary file which is
/// then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    key: String,
}

impl FileStore {
    /// Store using the default `stepCount` slot.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, DEFAULT_COUNT_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the whole document. A missing or empty file is an empty object.
    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn parse_slot(&self, value: &Value) -> Result<Option<u64>, StoreError> {
        let corrupt = || StoreError::Corrupt {
            key: self.key.clone(),
            value: value.to_string(),
        };
        match value {
            Value::Null => Ok(None),
            Value::String(text) => text.trim().parse::<u64>().map(Some).map_err(|_| corrupt()),
            Value::Number(n) => n.as_u64().map(Some).ok_or_else(corrupt),
            _ => Err(corrupt()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CountStore for FileStore {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        let document = self.read_document()?;
        match document.get(&self.key) {
            Some(value) => self.parse_slot(value),
            None => Ok(None),
        }
    }

    fn save(&self, count: u64) -> Result<(), StoreError> {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(StoreError::Serialize(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "count store document is malformed, replacing it"
                );
                Map::new()
            }
            Err(e) => return Err(e),
        };
        document.insert(self.key.clone(), Value::String(count.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let encoded = serde_json::to_string_pretty(&Value::Object(document))?;
        let temp = self.temp_path();
        fs::write(&temp, encoded).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

enum WriterMessage {
    Save(u64),
    Flush(Sender<()>),
}

/// Asynchronous write-through wrapper.
///
/// `save` queues the count and returns immediately. A dedicated writer
/// thread persists the most recent queued count and logs failures. `load`
/// is delegated synchronously since it only happens at initialization.
///
/// Dropping the store drains the queue and joins the writer.
pub struct BackgroundStore<S: CountStore + 'static> {
    inner: Arc<S>,
    tx: Option<Sender<WriterMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: CountStore + 'static> BackgroundStore<S> {
    /// Spawns the writer thread for `inner`.
    pub fn spawn(inner: S) -> Result<Self, StoreError> {
        let inner = Arc::new(inner);
        let (tx, rx) = mpsc::channel();
        let writer_store = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("count-store-writer".into())
            .spawn(move || run_writer(writer_store.as_ref(), rx))
            .map_err(|source| StoreError::Io {
                path: PathBuf::from("<count-store-writer>"),
                source,
            })?;

        Ok(Self {
            inner,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Blocks until every save queued before this call has been attempted.
    pub fn flush(&self) -> Result<(), StoreError> {
        let tx = self.tx.as_ref().ok_or(StoreError::WriterClosed)?;
        let (ack_tx, ack_rx) = mpsc::channel();
        tx.send(WriterMessage::Flush(ack_tx))
            .map_err(|_| StoreError::WriterClosed)?;
        ack_rx.recv().map_err(|_| StoreError::WriterClosed)
    }
}

impl<S: CountStore + 'static> CountStore for BackgroundStore<S> {
    fn load(&self) -> Result<Option<u64>, StoreError> {
        self.inner.load()
    }

    fn save(&self, count: u64) -> Result<(), StoreError> {
        let tx = self.tx.as_ref().ok_or(StoreError::WriterClosed)?;
        tx.send(WriterMessage::Save(count))
            .map_err(|_| StoreError::WriterClosed)
    }
}

impl<S: CountStore + 'static> Drop for BackgroundStore<S> {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("count store writer panicked");
            }
        }
    }
}

fn run_writer<S: CountStore + ?Sized>(store: &S, rx: Receiver<WriterMessage>) {
    while let Ok(first) = rx.recv() {
        let mut pending = None;
        let mut acks = Vec::new();

        // Coalesce everything already queued down to the latest count.
        let mut next = Some(first);
        while let Some(message) = next {
            match message {
                WriterMessage::Save(count) => pending = Some(count),
                WriterMessage::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if let Some(count) = pending {
            if let Err(e) = store.save(count) {
                tracing::warn!(error = %e, count, "failed to persist step count");
            }
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
}
