// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Binary codec for the collection payload.
//!
//! The wire body is a [`FollowSnapshot`]: the sender's collection timestamp
//! plus every record with explicit fields. `decode(encode(t, R)) == (t, R)`.

use thiserror::Error;

use crate::record::{FollowRecord, FollowSnapshot};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode follow payload: {0}")]
    Encode(String),
    #[error("Malformed follow payload: {0}")]
    Decode(String),
}

/// Serializes the collection to and from its binary wire form.
pub trait FollowCodec: Send + Sync {
    fn encode(&self, time: i64, records: &[FollowRecord]) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<FollowSnapshot, CodecError>;
}

/// Compact binary codec backed by postcard.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardCodec;

/// Borrowing mirror of [`FollowSnapshot`] so encoding needs no clone.
#[derive(serde::Serialize)]
struct SnapshotRef<'a> {
    time: i64,
    users: &'a [FollowRecord],
}

impl FollowCodec for PostcardCodec {
    fn encode(&self, time: i64, records: &[FollowRecord]) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(&SnapshotRef { time, users: records })
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<FollowSnapshot, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, time: i64) -> FollowRecord {
        FollowRecord {
            id: id.to_string(),
            name: format!("name-{}", id),
            bio: String::new(),
            url: format!("https://img/{}.png", id),
            time,
        }
    }

    #[test]
    fn test_encode_decode_preserves_time_and_records() {
        let codec = PostcardCodec;
        let records = vec![record("a", 1), record("b", 2)];

        let bytes = codec.encode(1_700_000_000_123, &records).unwrap();
        let snapshot = codec.decode(&bytes).unwrap();

        assert_eq!(snapshot.time, 1_700_000_000_123);
        assert_eq!(snapshot.users, records);
    }

    #[test]
    fn test_empty_collection_encodes() {
        let codec = PostcardCodec;
        let bytes = codec.encode(99, &[]).unwrap();
        let snapshot = codec.decode(&bytes).unwrap();
        assert_eq!(snapshot.time, 99);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_truncated_payload_is_decode_error() {
        let codec = PostcardCodec;
        let bytes = codec.encode(5, &[record("a", 1)]).unwrap();

        let result = codec.decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_empty_bytes_is_decode_error() {
        assert!(PostcardCodec.decode(&[]).is_err());
    }
}
