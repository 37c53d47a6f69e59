use crate::domain::ports::KeyValueStore;
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding one snapshot per key.
pub const CF_SNAPSHOTS: &str = "snapshots";

/// A persistent store implementation using RocksDB.
///
/// Snapshots live in their own column family, keyed by the snapshot name.
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "snapshots" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_snapshots = ColumnFamilyDescriptor::new(CF_SNAPSHOTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_snapshots])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn snapshots(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_SNAPSHOTS).ok_or_else(|| {
            DeskError::Storage(Box::new(std::io::Error::other(
                "Snapshots column family not found",
            )))
        })
    }
}

#[async_trait]
impl KeyValueStore for RocksDBStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.snapshots()?;
        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let cf = self.snapshots()?;
        self.db.put_cf(cf, key.as_bytes(), value)?;
        Ok(())
    }
}
