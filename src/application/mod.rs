//! Application layer: the registries that own each collection and the
//! cascade rules between them.
//!
//! Each registry keeps a session copy of its snapshot, loaded on first use
//! and rewritten in full after every mutation. Storage failures never abort
//! an operation; they travel back to the caller inside [`crate::error::Outcome`].

pub mod attendance;
pub mod classes;
pub mod collection;
pub mod desk;
pub mod payments;
pub mod teachers;
