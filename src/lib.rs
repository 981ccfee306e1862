//! # bigstore
//!
//! A single-file content store:
//! - One large preallocated binary file (the "bigfile") divided into
//!   fixed-size blocks holds all payload bytes
//! - An ordered persistent index maps each key to the byte range of the
//!   bigfile holding its data, plus a finalized flag
//! - Allocation and index updates commit atomically; a crash never leaves a
//!   half-applied allocation behind
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Datastore (facade)                    │
//! │        Create / Open / window lending / delegation       │
//! └───────────────┬────────────────────────┬────────────────┘
//!                 │                        │
//!                 ▼                        ▼
//!        ┌─────────────────┐      ┌─────────────────┐
//!        │     Region      │      │      Index      │
//!        │  (mmap of the   │      │ (block allocator│
//!        │   bigfile.bin)  │      │  + location map │
//!        │                 │      │   over redb)    │
//!        └─────────────────┘      └─────────────────┘
//! ```
//!
//! The core decides *which* byte range belongs to a key but never reads or
//! writes payload bytes itself; callers borrow bounds-checked windows into
//! the region and do their own I/O.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod datastore;
pub mod index;
pub mod region;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use datastore::Datastore;
pub use error::{Result, StoreError};
pub use index::{Index, Location, RedbIndex, BLOCK_SIZE, FLAG_FINALIZED};
pub use region::Region;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bigstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
