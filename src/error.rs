use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    /// Raised by callers that treat a lookup miss as a failure; the
    /// registries themselves report misses as `None`/`false`.
    #[error("No {kind} with id `{id}`")]
    NotFound { kind: &'static str, id: String },
    #[error("Payment {id} is already {status} and cannot be processed again")]
    InvalidTransition { id: String, status: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

pub type Result<T> = std::result::Result<T, DeskError>;

/// A persistence failure that did not abort the operation.
///
/// The in-memory effect of the operation still stands for the current
/// session; the caller decides whether to warn or retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to persist `{key}`: {message}")]
pub struct StorageFault {
    pub key: String,
    pub message: String,
}

impl StorageFault {
    pub fn new(key: &str, err: &DeskError) -> Self {
        Self {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// The value produced by a registry operation together with any storage
/// faults hit while loading or persisting the affected snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub faults: Vec<StorageFault>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            faults: Vec::new(),
        }
    }

    pub fn with_faults(value: T, faults: Vec<StorageFault>) -> Self {
        Self { value, faults }
    }

    /// True when every snapshot touched by the operation was read and written.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            faults: self.faults,
        }
    }

    pub fn absorb(&mut self, faults: impl IntoIterator<Item = StorageFault>) {
        self.faults.extend(faults);
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
