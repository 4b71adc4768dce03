//! Error types for tree operations and proof verification

use light_poseidon::PoseidonError;
use thiserror::Error;

/// Failures surfaced by the tree and by proof verification
#[derive(Debug, Error)]
pub enum TreeError {
    /// Depth outside the supported range at construction
    #[error("unsupported tree depth {depth}: must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },

    /// Insertion attempted into a full tree
    #[error("tree is full: all {capacity} leaf slots are occupied")]
    CapacityExceeded { capacity: u64 },

    /// Proof requested for a leaf index that has not been inserted
    #[error("leaf index {index} out of range: {leaf_count} leaves inserted")]
    IndexOutOfRange { index: u64, leaf_count: u64 },

    /// Index within range but no leaf recorded (append-only invariant broken)
    #[error("no leaf recorded at index {index}")]
    LeafNotFound { index: u64 },

    /// Path/sibling shape inconsistent with a valid proof
    #[error("malformed proof: {reason}")]
    MalformedProof { reason: String },

    /// Poseidon failure on well-formed input: fatal configuration error,
    /// never substituted with a fallback value
    #[error("poseidon hash failed: {0}")]
    Hash(#[from] PoseidonError),
}
