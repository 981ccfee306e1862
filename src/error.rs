//! Error types for bigstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for bigstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Datastore Boundary Errors
    // -------------------------------------------------------------------------
    #[error("the bigfile does not exist")]
    DoesNotExist,

    #[error("the datastore already exists")]
    AlreadyExists,

    #[error("path does not point to a directory")]
    NotADirectory,

    // -------------------------------------------------------------------------
    // Allocation Errors
    // -------------------------------------------------------------------------
    #[error("out of space: {requested} blocks requested, {available} available")]
    OutOfSpace { requested: u64, available: u64 },

    #[error("key not found")]
    KeyNotFound,

    #[error("key already has a live allocation")]
    KeyExists,

    #[error("allocation size must be greater than zero")]
    InvalidSize,

    // -------------------------------------------------------------------------
    // Region Errors
    // -------------------------------------------------------------------------
    #[error("window [{offset}, {offset}+{len}) exceeds region of {capacity} bytes")]
    WindowOutOfBounds { offset: u64, len: u64, capacity: u64 },

    // -------------------------------------------------------------------------
    // Index Store Errors
    // -------------------------------------------------------------------------
    #[error("corrupt index record: {0}")]
    CorruptRecord(String),

    #[error("index store error: {0}")]
    Index(#[from] redb::Error),
}

// redb surfaces a distinct error type per operation family; funnel them all
// into the unified `Index` variant so `?` works at every call site.
impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Index(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Index(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Index(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Index(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Index(err.into())
    }
}
