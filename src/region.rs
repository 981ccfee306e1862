//! Backing Storage Region
//!
//! A fixed-capacity, byte-addressable view over the preallocated bigfile —
//! a pure capacity container with no allocation semantics. The region is
//! owned by the [`Datastore`](crate::Datastore) facade and lent to callers
//! one bounds-checked window at a time; nothing in this crate interprets
//! the payload bytes.

use std::fs::File;

use memmap2::{MmapMut, MmapOptions};

use crate::error::{Result, StoreError};

/// Memory-mapped view over the full length of the bigfile
pub struct Region {
    map: MmapMut,
    /// Keeps the descriptor alive for the lifetime of the mapping
    _file: File,
}

impl Region {
    /// Map the full current length of `file`.
    ///
    /// `populate` pre-faults the mapping so first access never stalls on
    /// page-in.
    pub(crate) fn map(file: File, populate: bool) -> Result<Self> {
        let mut options = MmapOptions::new();
        if populate {
            options.populate();
        }
        // Safety: the datastore owns the file for its whole lifetime and
        // never truncates it while mapped.
        let map = unsafe { options.map_mut(&file)? };
        Ok(Self { map, _file: file })
    }

    /// Region length in bytes (the bigfile's size at open)
    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    /// True when the region holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Borrow a read-only window of `len` bytes starting at `offset`
    pub fn window(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let (start, end) = self.bounds(offset, len)?;
        Ok(&self.map[start..end])
    }

    /// Borrow a writable window of `len` bytes starting at `offset`
    pub fn window_mut(&mut self, offset: u64, len: u64) -> Result<&mut [u8]> {
        let (start, end) = self.bounds(offset, len)?;
        Ok(&mut self.map[start..end])
    }

    /// Flush the mapping to the backing file
    pub fn flush(&self) -> Result<()> {
        self.map.flush()?;
        Ok(())
    }

    fn bounds(&self, offset: u64, len: u64) -> Result<(usize, usize)> {
        let capacity = self.len();
        let end = offset.checked_add(len).filter(|end| *end <= capacity);
        match end {
            Some(end) => Ok((offset as usize, end as usize)),
            None => Err(StoreError::WindowOutOfBounds {
                offset,
                len,
                capacity,
            }),
        }
    }
}
