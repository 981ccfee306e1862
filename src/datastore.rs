//! Datastore Facade
//!
//! Composes the backing region and the allocator/index and validates the
//! on-disk layout at the boundary. This is the sole entry point external
//! callers use.
//!
//! ## Directory Layout
//! ```text
//! <dir>/
//!   ├── bigfile.bin   fixed-size file of raw payload bytes
//!   └── index/        redb index database (opaque to callers)
//! ```
//!
//! ## Write Path
//! 1. `allocate(key, len)` reserves a block-aligned range and persists it
//! 2. `window_mut(&location)` lends the caller that byte range
//! 3. the caller writes payload bytes and makes them durable (`sync`)
//! 4. `finalize(key)` marks the record committed
//! 5. later `lookup(key)` returns the committed location

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::index::{Index, Location, RedbIndex, BLOCK_SIZE};
use crate::region::Region;

/// File name of the backing payload file inside a datastore directory
pub const BIGFILE_NAME: &str = "bigfile.bin";

/// Sub-directory holding the index store's own on-disk files
const INDEX_DIR: &str = "index";

/// A single-file content store: one bigfile plus its location index
pub struct Datastore {
    root: PathBuf,
    region: Region,
    index: RedbIndex,
}

impl Datastore {
    /// Create a new datastore inside the directory at `path`.
    ///
    /// Creates a bigfile of exactly `size` bytes; index initialization is
    /// deferred to the first [`open`](Self::open). Fails with
    /// [`StoreError::NotADirectory`] when `path` is not a directory and
    /// [`StoreError::AlreadyExists`] when a bigfile is already present.
    pub fn create(path: impl AsRef<Path>, size: u64) -> Result<()> {
        let path = path.as_ref();
        if !fs::metadata(path)?.is_dir() {
            return Err(StoreError::NotADirectory);
        }

        let bigfile_path = path.join(BIGFILE_NAME);
        match fs::metadata(&bigfile_path) {
            Ok(_) => return Err(StoreError::AlreadyExists),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let file = fs::File::create(&bigfile_path)?;
        file.set_len(size)?;
        file.sync_all()?;

        tracing::info!(
            "created datastore at {} with a bigfile of {} bytes ({} blocks)",
            path.display(),
            size,
            size / BLOCK_SIZE
        );
        Ok(())
    }

    /// Open the datastore in the directory at `path` with default config.
    ///
    /// Fails with [`StoreError::DoesNotExist`] when no bigfile is present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, Config::default())
    }

    /// Open the datastore with an explicit [`Config`].
    ///
    /// Maps the bigfile's full current length as the backing region,
    /// derives the block capacity from it, and opens (creating if absent)
    /// the index store under the fixed `index/` sub-path.
    pub fn open_with(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        let bigfile = OpenOptions::new()
            .read(true)
            .write(true)
            .open(root.join(BIGFILE_NAME))
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => StoreError::DoesNotExist,
                _ => StoreError::Io(err),
            })?;

        let region = Region::map(bigfile, config.populate_region)?;
        let capacity_blocks = region.len() / BLOCK_SIZE;
        let index = RedbIndex::open(
            &root.join(INDEX_DIR),
            capacity_blocks,
            config.index_cache_bytes,
        )?;

        tracing::info!(
            "opened datastore at {}: {} bytes, {} blocks",
            root.display(),
            region.len(),
            capacity_blocks
        );

        Ok(Self {
            root,
            region,
            index,
        })
    }

    // =========================================================================
    // Index Operations
    // =========================================================================

    /// Read a key's committed or in-flight location
    pub fn lookup(&self, key: &[u8]) -> Result<Location> {
        self.index.lookup(key)
    }

    /// Reserve space for `size` bytes under `key`
    pub fn allocate(&self, key: &[u8], size: u64) -> Result<Location> {
        self.index.allocate(key, size)
    }

    /// Mark a key's payload durably complete
    pub fn finalize(&self, key: &[u8]) -> Result<()> {
        self.index.finalize(key)
    }

    /// Drop a key and return its blocks to the free pool
    pub fn free(&self, key: &[u8]) -> Result<()> {
        self.index.free(key)
    }

    // =========================================================================
    // Region Access
    // =========================================================================

    /// Borrow the byte range a location describes, read-only.
    ///
    /// Callers should not rely on the contents before the location is
    /// finalized.
    pub fn window(&self, location: &Location) -> Result<&[u8]> {
        self.region.window(location.offset, location.size)
    }

    /// Borrow the byte range a location describes for writing.
    ///
    /// Only valid for ranges returned by [`allocate`](Self::allocate); the
    /// core never writes payload bytes itself.
    pub fn window_mut(&mut self, location: &Location) -> Result<&mut [u8]> {
        self.region.window_mut(location.offset, location.size)
    }

    /// Flush the mapped region to disk. Run this before
    /// [`finalize`](Self::finalize) to make the payload itself durable.
    pub fn sync(&self) -> Result<()> {
        self.region.flush()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Root directory of this datastore
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Bigfile length in bytes
    pub fn len(&self) -> u64 {
        self.region.len()
    }

    /// True when the bigfile holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Total capacity in blocks, fixed at open time
    pub fn capacity_blocks(&self) -> u64 {
        self.index.capacity_blocks()
    }

    /// Blocks consumed by the bump cursor so far
    pub fn allocated_blocks(&self) -> Result<u64> {
        self.index.allocated_blocks()
    }

    /// Blocks currently available for reuse in the free pool
    pub fn free_blocks(&self) -> Result<u64> {
        self.index.free_blocks()
    }
}
