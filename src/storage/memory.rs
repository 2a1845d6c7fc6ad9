//! In-memory storage backend for dry runs and tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::storage::{RecordSet, WordStorage, WriteMetadata};

/// Keeps the store in memory and counts writes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<RecordSet>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(records: RecordSet) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// Copy of the currently stored records.
    pub fn snapshot(&self) -> RecordSet {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordStorage for MemoryStorage {
    async fn load(&self) -> Result<RecordSet> {
        Ok(self.snapshot())
    }

    async fn save(&self, records: &RecordSet) -> Result<WriteMetadata> {
        match self.records.lock() {
            Ok(mut guard) => *guard = records.clone(),
            Err(poisoned) => *poisoned.into_inner() = records.clone(),
        }
        self.saves.fetch_add(1, Ordering::SeqCst);

        Ok(WriteMetadata {
            entry_count: records.len(),
            location: self.location(),
            timestamp: Utc::now(),
        })
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
