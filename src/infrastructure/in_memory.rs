use crate::domain::ports::KeyValueStore;
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory key-value store.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the registries own another. Reads and writes can be made to fail on
/// demand to exercise the storage fault paths.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `get` fail until switched off.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.fail_reads.store(simulate, Ordering::SeqCst);
    }

    /// Makes every subsequent `set` fail until switched off.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.fail_writes.store(simulate, Ordering::SeqCst);
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(simulated("read"));
        }
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(simulated("write"));
        }
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

fn simulated(op: &str) -> DeskError {
    DeskError::Storage(Box::new(std::io::Error::other(format!(
        "Simulated {} error",
        op
    ))))
}
