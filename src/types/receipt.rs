//! Index summary: a compact, deterministic fingerprint of the index.

use sha2::{Digest, Sha256};
use ssz_rs::prelude::*;

/// Summary of an index at one point in time.
///
/// `state_root` is a SHA-256 digest over every record in identifier order,
/// so two indexes holding the same records, prices and event histories
/// produce the same summary regardless of how they got there.
///
/// ```
/// use stockbook::types::IndexSummary;
///
/// let summary = IndexSummary::new(3, 5, [0u8; 32]);
/// let bytes = ssz_rs::serialize(&summary).unwrap();
/// assert_eq!(bytes.len(), 48);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct IndexSummary {
    /// Records in the identifier index
    pub record_count: u64,

    /// Price events across all records, bootstrap events included
    pub event_count: u64,

    /// SHA-256 over the canonical record encoding
    pub state_root: [u8; 32],
}

impl IndexSummary {
    pub fn new(record_count: u64, event_count: u64, state_root: [u8; 32]) -> Self {
        Self {
            record_count,
            event_count,
            state_root,
        }
    }

    /// SHA-256 of arbitrary bytes
    pub fn compute_hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_new() {
        let summary = IndexSummary::new(2, 7, [1u8; 32]);

        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.event_count, 7);
        assert_eq!(summary.state_root, [1u8; 32]);
        assert!(!summary.is_empty());
        assert!(IndexSummary::default().is_empty());
    }

    #[test]
    fn test_hash_determinism() {
        let a = IndexSummary::compute_hash(b"state");
        let b = IndexSummary::compute_hash(b"state");
        let c = IndexSummary::compute_hash(b"other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_state_root_hex() {
        let summary = IndexSummary::new(0, 0, [0xAB; 32]);
        let hex = summary.state_root_hex();

        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("abab"));
    }

    #[test]
    fn test_summary_ssz_roundtrip() {
        let summary = IndexSummary::new(3, 9, [0x5A; 32]);

        let bytes = ssz_rs::serialize(&summary).expect("Failed to serialize");
        let decoded: IndexSummary = ssz_rs::deserialize(&bytes).expect("Failed to deserialize");

        // 8 + 8 + 32
        assert_eq!(bytes.len(), 48);
        assert_eq!(decoded, summary);
    }
}
