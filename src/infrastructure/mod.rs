//! Adapters implementing the domain ports: key-value stores, id generators,
//! random sources and clocks.

pub mod clock;
pub mod file;
pub mod ids;
pub mod in_memory;
pub mod random;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
