//! Content hashing for deterministic playback verification.
//!
//! Produces a SHA-256 hash over the serialized frame snapshots, so two runs of
//! the same timeline can be compared bit for bit.

use sha2::{Digest, Sha256};

use crate::error::SlateResult;
use crate::frame::FrameSnapshot;

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn finish(hasher: Sha256) -> ContentHash {
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    ContentHash::from_bytes(bytes)
}

/// Compute the content hash of a single frame snapshot.
pub fn hash_snapshot(snapshot: &FrameSnapshot) -> SlateResult<ContentHash> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(snapshot)?);
    Ok(finish(hasher))
}

/// Incremental hasher for a stream of snapshots.
pub struct SnapshotHasher {
    hasher: Sha256,
    count: u64,
}

impl SnapshotHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            count: 0,
        }
    }

    pub fn update(&mut self, snapshot: &FrameSnapshot) -> SlateResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        // Length-prefix each frame so boundaries are part of the digest.
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(&bytes);
        self.count += 1;
        Ok(())
    }

    pub fn finalize(self) -> ContentHash {
        let mut hasher = self.hasher;
        hasher.update(self.count.to_le_bytes());
        finish(hasher)
    }
}

impl Default for SnapshotHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the content hash of a whole playback.
pub fn hash_snapshots(snapshots: &[FrameSnapshot]) -> SlateResult<ContentHash> {
    let mut hasher = SnapshotHasher::new();
    for snapshot in snapshots {
        hasher.update(snapshot)?;
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(index: u64) -> FrameSnapshot {
        FrameSnapshot {
            index,
            time: index as f64 / 30.0,
            entry: Some(0),
            objects: Vec::new(),
        }
    }

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(
            hash_snapshot(&empty(3)).unwrap(),
            hash_snapshot(&empty(3)).unwrap()
        );
    }

    #[test]
    fn test_hash_different_frames() {
        assert_ne!(
            hash_snapshot(&empty(0)).unwrap(),
            hash_snapshot(&empty(1)).unwrap()
        );
    }

    #[test]
    fn test_hash_sequence_depends_on_count() {
        let one = hash_snapshots(&[empty(0)]).unwrap();
        let two = hash_snapshots(&[empty(0), empty(0)]).unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_hash_hex_format() {
        let hex = hash_snapshot(&empty(0)).unwrap().to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
