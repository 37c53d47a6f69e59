//! Runtime configuration: which store backs the registries and how the
//! injectable services are built.

use crate::application::desk::{Desk, Services};
use crate::application::payments::DEFAULT_SUCCESS_PROBABILITY;
use crate::domain::ports::{Clock, IdGenerator, Randomness, SharedStore};
use crate::domain::validation;
use crate::error::Result;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::file::FileStore;
use crate::infrastructure::ids::{TimestampIds, UuidIds};
use crate::infrastructure::in_memory::InMemoryStore;
use crate::infrastructure::random::{SeededRandom, ThreadRandom};
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const ROCKSDB_FALLBACK_WARNING: &str = "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum IdStrategy {
    /// Strictly increasing millisecond timestamps.
    #[default]
    Timestamp,
    /// Random v4 UUIDs.
    Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    #[default]
    InMemory,
    /// Directory of JSON snapshot files.
    Files(PathBuf),
    /// RocksDB database directory.
    RocksDb(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeskConfig {
    pub storage: StorageConfig,
    pub id_strategy: IdStrategy,
    pub rng_seed: Option<u64>,
    pub success_probability: f64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            id_strategy: IdStrategy::default(),
            rng_seed: None,
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
        }
    }
}

/// A store together with an optional notice for the user about how it was
/// chosen.
pub struct OpenedStore {
    pub store: SharedStore,
    pub notice: Option<&'static str>,
}

impl DeskConfig {
    pub fn validate(&self) -> Result<()> {
        validation::probability(self.success_probability)?;
        Ok(())
    }

    pub fn open_store(&self) -> Result<OpenedStore> {
        let opened = match &self.storage {
            StorageConfig::InMemory => OpenedStore {
                store: Arc::new(InMemoryStore::new()),
                notice: None,
            },
            StorageConfig::Files(dir) => {
                info!(dir = %dir.display(), "Using file storage");
                OpenedStore {
                    store: Arc::new(FileStore::open(dir)?),
                    notice: None,
                }
            }
            StorageConfig::RocksDb(path) => open_rocksdb(path)?,
        };
        Ok(opened)
    }

    pub fn services(&self) -> Services {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids: Arc<dyn IdGenerator> = match self.id_strategy {
            IdStrategy::Timestamp => Arc::new(TimestampIds::new(clock.clone())),
            IdStrategy::Uuid => Arc::new(UuidIds),
        };
        let random: Arc<dyn Randomness> = match self.rng_seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Services { ids, random, clock }
    }

    /// Validates the configuration and wires a [`Desk`] to the chosen store.
    pub fn build(&self) -> Result<(Desk, Option<&'static str>)> {
        self.validate()?;
        let OpenedStore { store, notice } = self.open_store()?;
        let desk = Desk::with_success_probability(store, self.services(), self.success_probability);
        Ok((desk, notice))
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_rocksdb(path: &std::path::Path) -> Result<OpenedStore> {
    use crate::infrastructure::rocksdb::RocksDBStore;
    info!(path = %path.display(), "Using RocksDB storage");
    Ok(OpenedStore {
        store: Arc::new(RocksDBStore::open(path)?),
        notice: None,
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_rocksdb(path: &std::path::Path) -> Result<OpenedStore> {
    tracing::warn!(path = %path.display(), "RocksDB support not compiled in");
    Ok(OpenedStore {
        store: Arc::new(InMemoryStore::new()),
        notice: Some(ROCKSDB_FALLBACK_WARNING),
    })
}
