//! Index Module
//!
//! Block allocator and location index: converts a size request into a
//! block-aligned byte range inside the fixed-capacity bigfile and durably
//! binds it to a key. All bookkeeping is expressed as updates against an
//! atomic ordered key-value store.
//!
//! ## Record Format (20 bytes, little-endian)
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ Offset: u64 (8)  │ Size: u64 (8) │ Flags: u32 (4)   │
//! └─────────────────────────────────────────────────────┘
//! ```
//! Offset is the byte position into the bigfile, always block-aligned.
//! Size is the caller-declared byte length (the last block may be partially
//! used). Flags bit 0 is the finalized marker.
//!
//! ## Key Space
//! One flat ordered store holds everything, partitioned by a structured
//! namespace tag (see [`key`]):
//! ```text
//! i/allocated          allocation cursor, u64 LE block count
//! i/free/<start BE>    free block range, u64 LE length in blocks
//! k/<user key>         location record, 20 bytes as above
//! ```

mod key;
mod redb_index;

pub use redb_index::RedbIndex;

use crate::error::{Result, StoreError};

// =============================================================================
// Format Constants
// =============================================================================

/// Allocation granule in bytes. Every offset handed out is a multiple of
/// this; space accounting happens in whole blocks.
pub const BLOCK_SIZE: u64 = 4 << 10;

/// Location flag: the payload at this location has been durably committed
pub const FLAG_FINALIZED: u32 = 0x1;

/// Encoded size of a location record: offset (8) + size (8) + flags (4)
pub const LOCATION_ENCODED_LEN: usize = 20;

// =============================================================================
// Location Record
// =============================================================================

/// Where a key's payload lives inside the bigfile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset into the bigfile (block-aligned)
    pub offset: u64,
    /// Declared byte length of the value
    pub size: u64,
    /// Bit field; see [`FLAG_FINALIZED`]
    pub flags: u32,
}

impl Location {
    /// True once `finalize` has marked this record durably complete
    pub fn is_finalized(&self) -> bool {
        self.flags & FLAG_FINALIZED != 0
    }

    /// First block covered by this location
    pub fn start_block(&self) -> u64 {
        self.offset / BLOCK_SIZE
    }

    /// Number of whole blocks this location occupies
    pub fn block_span(&self) -> u64 {
        self.size.div_ceil(BLOCK_SIZE)
    }

    /// Encode to the fixed 20-byte little-endian record format
    pub fn encode(&self) -> [u8; LOCATION_ENCODED_LEN] {
        let mut buf = [0u8; LOCATION_ENCODED_LEN];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..16].copy_from_slice(&self.size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.flags.to_le_bytes());
        buf
    }

    /// Decode from the fixed 20-byte record format
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != LOCATION_ENCODED_LEN {
            return Err(StoreError::CorruptRecord(format!(
                "location record is {} bytes, expected {}",
                buf.len(),
                LOCATION_ENCODED_LEN
            )));
        }
        let mut offset = [0u8; 8];
        let mut size = [0u8; 8];
        let mut flags = [0u8; 4];
        offset.copy_from_slice(&buf[0..8]);
        size.copy_from_slice(&buf[8..16]);
        flags.copy_from_slice(&buf[16..20]);
        Ok(Self {
            offset: u64::from_le_bytes(offset),
            size: u64::from_le_bytes(size),
            flags: u32::from_le_bytes(flags),
        })
    }
}

// =============================================================================
// Index Trait
// =============================================================================

/// The allocator/index seam.
///
/// Alternate backends (an embedded log-structured store, a flat-file store)
/// can replace [`RedbIndex`] without touching allocation callers.
pub trait Index {
    /// Read a key's location. Fails with [`StoreError::KeyNotFound`] if no
    /// record exists. No side effects; safe to call concurrently with
    /// everything else.
    fn lookup(&self, key: &[u8]) -> Result<Location>;

    /// Reserve a block-aligned byte range big enough for `size` bytes and
    /// durably bind it to `key`.
    ///
    /// Fails with [`StoreError::OutOfSpace`] when the request cannot be
    /// satisfied (no state changes on failure), [`StoreError::KeyExists`]
    /// when the key already has a live location, and
    /// [`StoreError::InvalidSize`] when `size` is zero.
    fn allocate(&self, key: &[u8], size: u64) -> Result<Location>;

    /// Set the finalized bit on a key's record, marking its payload durably
    /// complete. Fails with [`StoreError::KeyNotFound`] on unknown keys.
    fn finalize(&self, key: &[u8]) -> Result<()>;

    /// Remove a key's record and return its block span to the free pool,
    /// to be reused by future allocations before the cursor grows.
    /// Fails with [`StoreError::KeyNotFound`] on unknown keys.
    fn free(&self, key: &[u8]) -> Result<()>;
}
