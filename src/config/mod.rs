//! Persistent key-mapping storage.
//!
//! The manager depends only on the [`MappingStore`] contract; the concrete
//! codec lives behind it. The contract's one unusual rule: a corrupt mapping
//! is indistinguishable from an absent one. Whatever happened to the file,
//! the user ends up with the defaults instead of a startup failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{Action, KeyCombination};

pub mod file_store;

pub use file_store::FileMappingStore;

/// Errors that can occur while reading or writing the mapping.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Mapping or backup directory cannot be created or written to.
    #[error("Mapping directory not writable: {0}")]
    DirNotWritable(PathBuf),

    /// Failed to create the pre-write backup.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),

    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),

    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load/save contract for the persisted action→combination mapping.
pub trait MappingStore {
    /// Loads the persisted mapping, ordered as stored.
    ///
    /// Returns `Ok(None)` when no mapping exists *or* the stored data is
    /// corrupt. Corruption is logged and degraded, never propagated as
    /// fatal. Real I/O failures (permissions, hardware) are errors.
    fn load(&self) -> Result<Option<Vec<(Action, KeyCombination)>>, StoreError>;

    /// Persists the mapping. Callers pass entries in canonical action order
    /// so the output is deterministic.
    fn save(&self, entries: &[(Action, KeyCombination)]) -> Result<(), StoreError>;
}
