use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Raw key-value persistence, one serialized snapshot per key.
///
/// `get` returns `Ok(None)` when the key has never been written; `Err` is
/// reserved for a backend that is unreachable or refuses the read.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

pub type KeyValueStoreBox = Box<dyn KeyValueStore>;
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Source of record identifiers. Must never hand out the same id twice
/// within one process.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random decisions used by payment processing.
pub trait Randomness: Send + Sync {
    /// Returns true with the given probability, clamped to `[0, 1]`.
    fn chance(&self, probability: f64) -> bool;
    /// An uppercase alphanumeric token of `len` characters.
    fn token(&self, len: usize) -> String;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now_millis(&self) -> i64;
}
