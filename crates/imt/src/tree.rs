//! Append-only incremental Merkle tree

use std::collections::HashMap;

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::TreeError;
use crate::hasher::PoseidonHash;
use crate::proof::InclusionProof;
use crate::MAX_DEPTH;

/// Everything an external store needs to persist one inserted leaf
///
/// The tree hands this out on insertion and never depends on the store
/// keeping it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    /// Slot the leaf was inserted at
    pub index: u64,
    /// Raw leaf bytes as supplied by the caller
    pub data: Vec<u8>,
    /// Field element committed into the tree
    #[serde(with = "crate::proof::fr_decimal")]
    pub encoded: Fr,
}

/// Fixed-depth append-only Merkle tree with O(depth) insertion
///
/// Leaves fill slots left to right; unoccupied subtrees contribute
/// precomputed empty-node hashes. Per layer the tree keeps the history of
/// node values written at left-child positions, which is what lets both
/// insertion and proof generation run in O(depth): insertion reads a
/// layer's latest entry, proof generation reads the entry that was current
/// when its leaf went in.
///
/// Single-writer: concurrent insertion must be serialized by the caller.
/// Proof generation takes `&self` and is safe to run concurrently while no
/// insertion is in flight.
#[derive(Clone, Debug)]
pub struct IncrementalMerkleTree {
    depth: usize,
    zero: Fr,
    root: Option<Fr>,
    next_index: u64,
    /// empty_nodes[k]: root of an empty subtree of height k
    empty_nodes: Vec<Fr>,
    /// Per layer, node values written at left-child positions, indexed by
    /// position / 2. The entry for a completed subtree is final; only the
    /// tail entry can still change as its subtree fills up.
    filled: Vec<Vec<Fr>>,
    /// Siblings used by the most recent insertion, diagnostics only
    last_siblings: Vec<Fr>,
    /// Encoded leaf per index
    leaves: HashMap<u64, Fr>,
}

impl IncrementalMerkleTree {
    /// Create an empty tree of the given depth
    ///
    /// `zero` is the canonical empty-leaf value. The empty-subtree hash of
    /// every layer is precomputed here; nothing else hashes at construction.
    pub fn new(depth: usize, zero: Fr) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth {
                depth,
                max: MAX_DEPTH,
            });
        }
        let mut empty_nodes = Vec::with_capacity(depth + 1);
        empty_nodes.push(zero);
        for layer in 1..=depth {
            let below = empty_nodes[layer - 1];
            empty_nodes.push(PoseidonHash::hash_pair(&below, &below)?);
        }
        Ok(Self {
            depth,
            zero,
            root: None,
            next_index: 0,
            empty_nodes,
            filled: vec![Vec::new(); depth],
            last_siblings: Vec::new(),
            leaves: HashMap::new(),
        })
    }

    /// Tree depth fixed at construction
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Total number of leaf slots
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of leaves inserted so far; also the next free slot
    pub fn leaf_count(&self) -> u64 {
        self.next_index
    }

    /// Current root commitment; `None` until the first insertion
    pub fn root(&self) -> Option<Fr> {
        self.root
    }

    /// Canonical empty-leaf value
    pub fn zero(&self) -> Fr {
        self.zero
    }

    /// Encoded leaf at an index, if one was inserted there
    pub fn leaf(&self, index: u64) -> Option<Fr> {
        self.leaves.get(&index).copied()
    }

    /// Hash of an empty subtree of height `layer`, up to and including the
    /// full tree height
    pub fn empty_node(&self, layer: usize) -> Option<Fr> {
        self.empty_nodes.get(layer).copied()
    }

    /// Siblings consumed by the most recent insertion
    ///
    /// Diagnostics only: not authoritative for proofs of older leaves.
    pub fn last_siblings(&self) -> &[Fr] {
        &self.last_siblings
    }

    /// Insert a leaf into the next free slot
    ///
    /// Walks one node per layer: a right child hashes against the recorded
    /// left sibling, a left child records itself for future right siblings
    /// and hashes against the empty node. Returns the record an external
    /// store can persist. A hash failure leaves the tree unchanged.
    pub fn insert(&mut self, data: &[u8]) -> Result<LeafRecord, TreeError> {
        if self.next_index == self.capacity() {
            return Err(TreeError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        let index = self.next_index;
        let encoded = PoseidonHash::encode_leaf(data);

        let mut node = encoded;
        let mut idx = index;
        let mut siblings = Vec::with_capacity(self.depth);
        let mut filled_writes = Vec::with_capacity(self.depth);
        for layer in 0..self.depth {
            let is_right = idx & 1 == 1;
            let sibling = if is_right {
                self.filled[layer][((idx - 1) / 2) as usize]
            } else {
                filled_writes.push((layer, (idx / 2) as usize, node));
                self.empty_nodes[layer]
            };
            node = if is_right {
                PoseidonHash::hash_pair(&sibling, &node)?
            } else {
                PoseidonHash::hash_pair(&node, &sibling)?
            };
            trace!(
                "insert layer {}: bit {} node {}",
                layer,
                idx & 1,
                PoseidonHash::to_hex(&node)
            );
            siblings.push(sibling);
            idx >>= 1;
        }

        // All hashing succeeded; commit the new state
        for (layer, slot, value) in filled_writes {
            if slot == self.filled[layer].len() {
                self.filled[layer].push(value);
            } else {
                self.filled[layer][slot] = value;
            }
        }
        self.root = Some(node);
        self.last_siblings = siblings;
        self.leaves.insert(index, encoded);
        self.next_index += 1;
        debug!("inserted leaf {} root {}", index, PoseidonHash::to_hex(&node));

        Ok(LeafRecord {
            index,
            data: data.to_vec(),
            encoded,
        })
    }

    /// Generate an inclusion proof for an already-inserted leaf
    ///
    /// Read-only replay of that leaf's insertion against the filled-node
    /// history: the returned proof commits to the root as it stood right
    /// after the leaf went in, and stays valid against it no matter how
    /// many leaves are appended later. Proofs for different leaves can be
    /// generated in any order without affecting one another.
    pub fn proof(&self, index: u64) -> Result<InclusionProof, TreeError> {
        if index >= self.next_index {
            return Err(TreeError::IndexOutOfRange {
                index,
                leaf_count: self.next_index,
            });
        }
        let encoded = self
            .leaves
            .get(&index)
            .copied()
            .ok_or(TreeError::LeafNotFound { index })?;

        let mut node = encoded;
        let mut idx = index;
        let mut path = Vec::with_capacity(self.depth);
        let mut siblings = Vec::with_capacity(self.depth);
        for layer in 0..self.depth {
            let (bit, sibling) = if idx & 1 == 1 {
                // The left sibling subtree filled up before this leaf went
                // in, so its history entry is final.
                (1, self.filled[layer][((idx - 1) / 2) as usize])
            } else {
                (0, self.empty_nodes[layer])
            };
            node = if bit == 1 {
                PoseidonHash::hash_pair(&sibling, &node)?
            } else {
                PoseidonHash::hash_pair(&node, &sibling)?
            };
            path.push(bit);
            siblings.push(sibling);
            idx >>= 1;
        }
        debug!("proof for leaf {} root {}", index, PoseidonHash::to_hex(&node));

        Ok(InclusionProof {
            path,
            siblings,
            root: node,
        })
    }
}
