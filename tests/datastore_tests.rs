//! Tests for the Datastore facade
//!
//! These tests verify:
//! - Create/Open boundary validation (missing bigfile, existing store,
//!   non-directory paths)
//! - Directory layout and bigfile sizing
//! - Window lending bounds checks
//! - Payload round trips through lent windows across reopen

use bigstore::{Datastore, Location, StoreError, BLOCK_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store(size: u64) -> (TempDir, Datastore) {
    let dir = TempDir::new().unwrap();
    Datastore::create(dir.path(), size).unwrap();
    let store = Datastore::open(dir.path()).unwrap();
    (dir, store)
}

// =============================================================================
// Create / Open Boundary
// =============================================================================

#[test]
fn test_open_empty_dir_fails() {
    let dir = TempDir::new().unwrap();

    let result = Datastore::open(dir.path());

    assert!(matches!(result, Err(StoreError::DoesNotExist)));
}

#[test]
fn test_create_sizes_bigfile_exactly() {
    let size = 10 << 10;
    let dir = TempDir::new().unwrap();

    Datastore::create(dir.path(), size).unwrap();

    let meta = std::fs::metadata(dir.path().join("bigfile.bin")).unwrap();
    assert_eq!(meta.len(), size);
}

#[test]
fn test_create_then_open() {
    let size = 10 << 10;
    let (_dir, store) = setup_store(size);

    assert_eq!(store.len(), size);
    assert_eq!(store.capacity_blocks(), size / BLOCK_SIZE);
}

#[test]
fn test_create_over_existing_store_fails() {
    let dir = TempDir::new().unwrap();
    Datastore::create(dir.path(), 4096).unwrap();

    let result = Datastore::create(dir.path(), 4096);

    assert!(matches!(result, Err(StoreError::AlreadyExists)));
}

#[test]
fn test_create_on_file_path_fails() {
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("not_a_dir");
    std::fs::write(&file_path, b"plain file").unwrap();

    let result = Datastore::create(&file_path, 4096);

    assert!(matches!(result, Err(StoreError::NotADirectory)));
}

#[test]
fn test_create_on_missing_path_fails_with_io() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does_not_exist");

    let result = Datastore::create(&missing, 4096);

    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[test]
fn test_directory_layout() {
    let (dir, _store) = setup_store(8192);

    assert!(dir.path().join("bigfile.bin").is_file());
    assert!(dir.path().join("index").is_dir());
}

// =============================================================================
// Window Lending
// =============================================================================

#[test]
fn test_window_matches_location() {
    let (_dir, store) = setup_store(64 * 1024);

    let loc = store.allocate(b"entry", 1000).unwrap();
    let window = store.window(&loc).unwrap();

    assert_eq!(window.len(), 1000);
}

#[test]
fn test_window_out_of_bounds() {
    let (_dir, store) = setup_store(8192);

    // A location pointing past the region must be refused, not wrapped.
    let bogus = Location {
        offset: 8192,
        size: 1,
        flags: 0,
    };
    let result = store.window(&bogus);

    assert!(matches!(result, Err(StoreError::WindowOutOfBounds { .. })));
}

#[test]
fn test_payload_roundtrip_across_reopen() {
    let dir = TempDir::new().unwrap();
    Datastore::create(dir.path(), 64 * 1024).unwrap();

    let loc = {
        let mut store = Datastore::open(dir.path()).unwrap();
        let loc = store.allocate(b"greeting", 13).unwrap();
        store.window_mut(&loc).unwrap().copy_from_slice(b"hello, world!");
        store.sync().unwrap();
        store.finalize(b"greeting").unwrap();
        loc
    };

    let store = Datastore::open(dir.path()).unwrap();
    let found = store.lookup(b"greeting").unwrap();
    assert_eq!(found.offset, loc.offset);
    assert_eq!(found.size, 13);
    assert!(found.is_finalized());
    assert_eq!(store.window(&found).unwrap(), b"hello, world!");
}
