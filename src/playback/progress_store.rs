use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ProgressStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where watched-percent records live, keyed by content id
///
/// Owned by the host and handed to the playback controller. Writes are
/// fire-and-forget; a backend that cannot persist logs and moves on.
pub trait ProgressStore: Send + Sync {
    fn read(&self, content_id: &str) -> Option<u8>;
    fn write(&self, content_id: &str, percent: u8);
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<String, u8>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read(&self, content_id: &str) -> Option<u8> {
        self.records.lock().unwrap().get(content_id).copied()
    }

    fn write(&self, content_id: &str, percent: u8) {
        self.records
            .lock()
            .unwrap()
            .insert(content_id.to_string(), percent.min(100));
    }
}

/// Progress records kept in a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileProgressStore {
    path: PathBuf,
    records: Mutex<HashMap<String, u8>>,
}

impl JsonFileProgressStore {
    /// Open (or start) the progress file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProgressStoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let data = std::fs::read(&path)?;
            if data.is_empty() {
                HashMap::new()
            } else {
                serde_json::from_slice(&data)?
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            HashMap::new()
        };

        info!(
            "Loaded {} progress records from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn flush(&self, records: &HashMap<String, u8>) -> Result<(), ProgressStoreError> {
        let data = serde_json::to_vec_pretty(records)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileProgressStore {
    fn read(&self, content_id: &str) -> Option<u8> {
        self.records.lock().unwrap().get(content_id).copied()
    }

    fn write(&self, content_id: &str, percent: u8) {
        let mut records = self.records.lock().unwrap();
        let percent = percent.min(100);
        if records.get(content_id) == Some(&percent) {
            return;
        }
        records.insert(content_id.to_string(), percent);
        if let Err(e) = self.flush(&records) {
            warn!(
                "Failed to persist progress for {} to {}: {}",
                content_id,
                self.path.display(),
                e
            );
        }
    }
}
