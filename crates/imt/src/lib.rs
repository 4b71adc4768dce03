//! Append-only incremental Merkle tree over the Poseidon hash
//!
//! This crate maintains a fixed-depth binary Merkle tree as a compact,
//! updatable commitment to a growing list of leaves (batch/rollup-style
//! pipelines). Key features:
//! - O(depth) insertion: per-layer filled-node bookkeeping instead of
//!   recomputing the whole tree
//! - Read-only proof generation: proofs for already-inserted leaves replay
//!   the filled-node history without touching live state
//! - Stateless verification: leaf bytes plus a proof recompute the root
//!   with no tree access

mod error;
mod hasher;
mod proof;
mod tree;

pub use error::TreeError;
pub use hasher::{root_matches_hex, PoseidonHash};
pub use proof::{InclusionProof, Verification};
pub use tree::{IncrementalMerkleTree, LeafRecord};

/// Highest supported tree depth (leaf slots are addressed with a u64)
pub const MAX_DEPTH: usize = 63;

/// Width of a hex-rendered root: 32 bytes, 64 nibbles
pub const ROOT_HEX_LEN: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_zero() -> ark_bn254::Fr {
        PoseidonHash::encode_leaf(b"seed")
    }

    #[test]
    fn test_empty_tree() {
        let tree = IncrementalMerkleTree::new(16, seed_zero()).unwrap();
        assert_eq!(tree.root(), None);
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.capacity(), 1 << 16);
    }

    #[test]
    fn test_insert_and_proof() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("imt=trace")
            .with_test_writer()
            .try_init();

        let mut tree = IncrementalMerkleTree::new(16, seed_zero()).unwrap();
        for leaf in [b"A" as &[u8], b"B", b"C", b"D"] {
            tree.insert(leaf).unwrap();
        }

        let proof = tree.proof(2).unwrap();
        assert_eq!(proof.path.len(), 16);
        assert_eq!(proof.siblings.len(), 16);
        let pre_e_root = proof.root;
        assert!(proof.verify(b"C", &pre_e_root).unwrap().matches);

        // Appending must not disturb a proof already handed out
        tree.insert(b"E").unwrap();
        assert!(proof.verify(b"C", &pre_e_root).unwrap().matches);
        assert_eq!(tree.proof(2).unwrap(), proof);
    }

    #[test]
    fn test_root_hex_comparison() {
        let mut tree = IncrementalMerkleTree::new(8, seed_zero()).unwrap();
        tree.insert(b"commitment").unwrap();
        let root = tree.root().unwrap();
        let rendered = PoseidonHash::to_hex(&root);
        assert!(root_matches_hex(&root, &rendered));
        assert!(root_matches_hex(&root, &format!("0x{rendered}")));
    }
}
