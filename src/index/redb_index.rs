//! Redb-backed allocator and location index.
//!
//! One flat ordered table holds the allocation cursor, the free-range pool,
//! and every location record (see the module docs in [`super`] for the key
//! layout). Allocate commits the cursor bump and the new record in a single
//! write transaction, so a crash can never leave one without the other.
//!
//! ## Concurrency
//!
//! redb gives atomic multi-key write transactions and snapshot-isolated
//! reads, but not cross-call serialization: two allocates racing from the
//! cursor read to the commit could both observe the same pre-update value.
//! `alloc_lock` spans that whole region, and likewise the read-modify-write
//! spans of finalize and free. Lookup takes no lock; its read transaction
//! sees either all of a committed allocation or none of it.

use std::path::Path;

use parking_lot::Mutex;
use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{Result, StoreError};

use super::{key, Index, Location, BLOCK_SIZE, FLAG_FINALIZED};

/// File name of the redb database inside the index sub-directory
const INDEX_DB_NAME: &str = "index.redb";

/// The single flat ordered table holding all index state
const INDEX_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("bigstore_index");

/// Internal counter name for the allocation cursor (block count, u64 LE)
const CURSOR_NAME: &[u8] = b"allocated";

/// Internal name prefix for free ranges; the range's start block follows in
/// big-endian so lexicographic order equals numeric order
const FREE_PREFIX: &[u8] = b"free/";

/// Block allocator and location index persisted in a redb database
pub struct RedbIndex {
    db: Database,
    /// Total capacity of the backing region, fixed at open
    capacity_blocks: u64,
    /// Serializes the read -> compute -> commit spans of allocate,
    /// finalize, and free (see module docs)
    alloc_lock: Mutex<()>,
}

impl RedbIndex {
    /// Open (creating if absent) the index database under `dir`, sized for
    /// a backing region of `capacity_blocks` blocks.
    pub fn open(dir: &Path, capacity_blocks: u64, cache_bytes: Option<usize>) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut builder = Database::builder();
        if let Some(bytes) = cache_bytes {
            builder.set_cache_size(bytes);
        }
        let db = builder.create(dir.join(INDEX_DB_NAME))?;

        // Make sure the table exists so read transactions never have to
        // special-case a fresh database.
        let txn = db.begin_write()?;
        txn.open_table(INDEX_TABLE)?;
        txn.commit()?;

        tracing::debug!(
            "opened index at {} with capacity of {} blocks",
            dir.display(),
            capacity_blocks
        );

        Ok(Self {
            db,
            capacity_blocks,
            alloc_lock: Mutex::new(()),
        })
    }

    /// Total capacity in blocks, fixed at open time
    pub fn capacity_blocks(&self) -> u64 {
        self.capacity_blocks
    }

    /// Current allocation cursor: blocks consumed by bump allocation so far
    /// (freed blocks re-enter the pool; the cursor never moves back)
    pub fn allocated_blocks(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INDEX_TABLE)?;
        let cursor_key = key::internal(CURSOR_NAME);
        match table.get(cursor_key.as_slice())? {
            Some(guard) => decode_u64(guard.value(), "allocation cursor"),
            None => Ok(0),
        }
    }

    /// Total blocks currently sitting in the free pool
    pub fn free_blocks(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INDEX_TABLE)?;
        let prefix = key::internal(FREE_PREFIX);
        let mut total = 0u64;
        for item in table.range::<&[u8]>(prefix.as_slice()..)? {
            let (k, v) = item?;
            if !k.value().starts_with(prefix.as_slice()) {
                break;
            }
            total += decode_u64(v.value(), "free range length")?;
        }
        Ok(total)
    }
}

impl Index for RedbIndex {
    fn lookup(&self, user_key: &[u8]) -> Result<Location> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(INDEX_TABLE)?;
        let entry_key = key::entry(user_key);
        match table.get(entry_key.as_slice())? {
            Some(guard) => Location::decode(guard.value()),
            None => Err(StoreError::KeyNotFound),
        }
    }

    fn allocate(&self, user_key: &[u8], size: u64) -> Result<Location> {
        if size == 0 {
            return Err(StoreError::InvalidSize);
        }
        let min_blocks = size.div_ceil(BLOCK_SIZE);
        let entry_key = key::entry(user_key);

        let _guard = self.alloc_lock.lock();

        let txn = self.db.begin_write()?;
        let location;
        {
            let mut table = txn.open_table(INDEX_TABLE)?;

            // One live location per key: a second allocate is an error, not
            // an overwrite.
            if table.get(entry_key.as_slice())?.is_some() {
                return Err(StoreError::KeyExists);
            }

            // Freed ranges are reused before the cursor grows.
            let start_block = match take_free_range(&mut table, min_blocks)? {
                Some(start) => {
                    tracing::debug!(
                        "allocating {} blocks at block {} from the free pool",
                        min_blocks,
                        start
                    );
                    start
                }
                None => {
                    let cursor_key = key::internal(CURSOR_NAME);
                    let cursor = match table.get(cursor_key.as_slice())? {
                        Some(guard) => decode_u64(guard.value(), "allocation cursor")?,
                        None => 0,
                    };
                    let available = self.capacity_blocks.saturating_sub(cursor);
                    if min_blocks > available {
                        // Transaction dropped without commit: nothing changed.
                        return Err(StoreError::OutOfSpace {
                            requested: min_blocks,
                            available,
                        });
                    }
                    let next = cursor + min_blocks;
                    table.insert(cursor_key.as_slice(), next.to_le_bytes().as_slice())?;
                    tracing::debug!(
                        "allocating {} blocks at block {} by cursor bump (cursor now {})",
                        min_blocks,
                        cursor,
                        next
                    );
                    cursor
                }
            };

            location = Location {
                offset: start_block * BLOCK_SIZE,
                size,
                flags: 0,
            };
            table.insert(entry_key.as_slice(), location.encode().as_slice())?;
        }
        txn.commit()?;

        Ok(location)
    }

    fn finalize(&self, user_key: &[u8]) -> Result<()> {
        let entry_key = key::entry(user_key);

        let _guard = self.alloc_lock.lock();

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(INDEX_TABLE)?;
            let mut location = match table.get(entry_key.as_slice())? {
                Some(guard) => Location::decode(guard.value())?,
                None => return Err(StoreError::KeyNotFound),
            };
            location.flags |= FLAG_FINALIZED;
            table.insert(entry_key.as_slice(), location.encode().as_slice())?;
            tracing::debug!(
                "finalized location at offset {} ({} bytes)",
                location.offset,
                location.size
            );
        }
        txn.commit()?;
        Ok(())
    }

    fn free(&self, user_key: &[u8]) -> Result<()> {
        let entry_key = key::entry(user_key);

        let _guard = self.alloc_lock.lock();

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(INDEX_TABLE)?;
            let location = match table.get(entry_key.as_slice())? {
                Some(guard) => Location::decode(guard.value())?,
                None => return Err(StoreError::KeyNotFound),
            };
            table.remove(entry_key.as_slice())?;

            let mut start = location.start_block();
            let mut len = location.block_span();

            // Coalesce with the range starting right after ours.
            let successor_key = free_key(start + len);
            let successor_len = match table.get(successor_key.as_slice())? {
                Some(guard) => Some(decode_u64(guard.value(), "free range length")?),
                None => None,
            };
            if let Some(successor_len) = successor_len {
                table.remove(successor_key.as_slice())?;
                len += successor_len;
            }

            // Coalesce with the nearest range below, if it ends at our start.
            let prefix = key::internal(FREE_PREFIX);
            let our_key = free_key(start);
            let predecessor = {
                let mut iter =
                    table.range::<&[u8]>(prefix.as_slice()..our_key.as_slice())?;
                match iter.next_back() {
                    Some(item) => {
                        let (k, v) = item?;
                        if k.value().starts_with(prefix.as_slice()) {
                            let pred_start = decode_free_start(k.value(), &prefix)?;
                            let pred_len = decode_u64(v.value(), "free range length")?;
                            Some((pred_start, pred_len))
                        } else {
                            None
                        }
                    }
                    None => None,
                }
            };
            if let Some((pred_start, pred_len)) = predecessor {
                if pred_start + pred_len == start {
                    table.remove(free_key(pred_start).as_slice())?;
                    start = pred_start;
                    len += pred_len;
                }
            }

            table.insert(free_key(start).as_slice(), len.to_le_bytes().as_slice())?;
            tracing::debug!(
                "freed {} blocks; pool range now [{}, {})",
                location.block_span(),
                start,
                start + len
            );
        }
        txn.commit()?;

        Ok(())
    }
}

// =============================================================================
// Free Pool Helpers
// =============================================================================

/// Encoded index key for the free range starting at `start_block`
fn free_key(start_block: u64) -> Vec<u8> {
    let mut name = Vec::with_capacity(FREE_PREFIX.len() + 8);
    name.extend_from_slice(FREE_PREFIX);
    name.extend_from_slice(&start_block.to_be_bytes());
    key::internal(&name)
}

/// Recover the start block from an encoded free-range key
fn decode_free_start(encoded: &[u8], prefix: &[u8]) -> Result<u64> {
    let tail: [u8; 8] = encoded[prefix.len()..].try_into().map_err(|_| {
        StoreError::CorruptRecord(format!(
            "free range key is {} bytes, expected {}",
            encoded.len(),
            prefix.len() + 8
        ))
    })?;
    Ok(u64::from_be_bytes(tail))
}

/// First-fit scan of the free pool. On a hit the range is removed and, when
/// larger than needed, its tail is reinserted; returns the start block.
fn take_free_range(
    table: &mut redb::Table<'_, &'static [u8], &'static [u8]>,
    min_blocks: u64,
) -> Result<Option<u64>> {
    let prefix = key::internal(FREE_PREFIX);
    let mut found = None;
    for item in table.range::<&[u8]>(prefix.as_slice()..)? {
        let (k, v) = item?;
        if !k.value().starts_with(prefix.as_slice()) {
            break;
        }
        let start = decode_free_start(k.value(), &prefix)?;
        let len = decode_u64(v.value(), "free range length")?;
        if len >= min_blocks {
            found = Some((start, len));
            break;
        }
    }

    let (start, len) = match found {
        Some(range) => range,
        None => return Ok(None),
    };

    table.remove(free_key(start).as_slice())?;
    if len > min_blocks {
        let tail_start = start + min_blocks;
        let tail_len = len - min_blocks;
        table.insert(
            free_key(tail_start).as_slice(),
            tail_len.to_le_bytes().as_slice(),
        )?;
    }
    Ok(Some(start))
}

/// Decode an 8-byte little-endian counter value
fn decode_u64(buf: &[u8], what: &str) -> Result<u64> {
    let arr: [u8; 8] = buf.try_into().map_err(|_| {
        StoreError::CorruptRecord(format!("{} is {} bytes, expected 8", what, buf.len()))
    })?;
    Ok(u64::from_le_bytes(arr))
}
