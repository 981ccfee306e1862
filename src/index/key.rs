//! Structured key encoding for the index store.
//!
//! Everything lives in one flat ordered store, partitioned by a one-byte
//! namespace tag followed by a separator:
//!
//! ```text
//! i/<name>       allocator-internal counters and free ranges
//! k/<user key>   per-entry location records
//! ```
//!
//! The tag is a fixed field, not a string prefix glued onto the payload: a
//! user key of `i/allocated` encodes as `k/i/allocated` and can never shadow
//! an internal counter. Payload bytes are carried verbatim, so user keys
//! remain fully opaque.

/// Namespace tag for an encoded index key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Namespace {
    /// Allocator-internal state (`i/`)
    Internal,
    /// User entry records (`k/`)
    Entry,
}

impl Namespace {
    fn tag(self) -> u8 {
        match self {
            Namespace::Internal => b'i',
            Namespace::Entry => b'k',
        }
    }
}

const SEPARATOR: u8 = b'/';

/// Encode a namespaced key: `<tag> <'/'> <payload>`
pub(super) fn encode(ns: Namespace, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + payload.len());
    buf.push(ns.tag());
    buf.push(SEPARATOR);
    buf.extend_from_slice(payload);
    buf
}

/// Encoded key for a user entry's location record
pub(super) fn entry(user_key: &[u8]) -> Vec<u8> {
    encode(Namespace::Entry, user_key)
}

/// Encoded key for an internal counter
pub(super) fn internal(name: &[u8]) -> Vec<u8> {
    encode(Namespace::Internal, name)
}
