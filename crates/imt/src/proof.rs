//! Inclusion proofs and verification

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::hasher::PoseidonHash;

/// Merkle inclusion proof for one leaf
///
/// `root` is the commitment the proof was generated against: the tree root
/// as it stood immediately after the proven leaf was inserted. Later appends
/// never invalidate the proof against this root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Branch direction per layer, leaf to root: 0 = left child, 1 = right
    pub path: Vec<u8>,
    /// Sibling value per layer, leaf to root
    #[serde(with = "fr_vec_decimal")]
    pub siblings: Vec<Fr>,
    /// Root the proof commits to
    #[serde(with = "fr_decimal")]
    pub root: Fr,
}

/// Outcome of a verification, carrying both roots for diagnostics
#[derive(Clone, Debug)]
pub struct Verification {
    /// Whether the recomputed root equals the expected one
    pub matches: bool,
    /// Root the caller supplied
    pub expected: Fr,
    /// Root recomputed from the leaf bytes and the proof
    pub computed: Fr,
}

impl InclusionProof {
    /// Number of layers the proof covers
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Verify this proof against an expected root
    ///
    /// Pure: reads no tree state and mutates nothing, so it is safe to call
    /// concurrently and repeatedly. The tree depth is taken from the proof
    /// shape itself.
    pub fn verify(&self, leaf_data: &[u8], expected_root: &Fr) -> Result<Verification, TreeError> {
        let computed = self.compute_root(leaf_data)?;
        Ok(Verification {
            matches: computed == *expected_root,
            expected: *expected_root,
            computed,
        })
    }

    /// Recompute the root this proof yields for the given leaf bytes
    pub fn compute_root(&self, leaf_data: &[u8]) -> Result<Fr, TreeError> {
        if self.path.is_empty() || self.path.len() != self.siblings.len() {
            return Err(TreeError::MalformedProof {
                reason: format!(
                    "{} path bits vs {} siblings",
                    self.path.len(),
                    self.siblings.len()
                ),
            });
        }
        let mut node = PoseidonHash::encode_leaf(leaf_data);
        for (layer, (&bit, sibling)) in self.path.iter().zip(self.siblings.iter()).enumerate() {
            node = match bit {
                0 => PoseidonHash::hash_pair(&node, sibling)?,
                1 => PoseidonHash::hash_pair(sibling, &node)?,
                other => {
                    return Err(TreeError::MalformedProof {
                        reason: format!("path bit {other} at layer {layer} is not 0 or 1"),
                    })
                }
            };
        }
        Ok(node)
    }
}

/// Serde adapter: one field element as a decimal string
pub(crate) mod fr_decimal {
    use ark_bn254::Fr;
    use ark_ff::PrimeField;
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BigUint::from(value.into_bigint()).to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let text = String::deserialize(deserializer)?;
        let value = text.parse::<BigUint>().map_err(de::Error::custom)?;
        Ok(Fr::from(value))
    }
}

/// Serde adapter: a sibling list as decimal strings
pub(crate) mod fr_vec_decimal {
    use ark_bn254::Fr;
    use ark_ff::PrimeField;
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            values
                .iter()
                .map(|v| BigUint::from(v.into_bigint()).to_str_radix(10)),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .into_iter()
            .map(|text| {
                let value = text.parse::<BigUint>().map_err(de::Error::custom)?;
                Ok(Fr::from(value))
            })
            .collect()
    }
}
