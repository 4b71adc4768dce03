//! Poseidon hasher and leaf encoding

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher as _};
use sha2::{Digest, Sha256};

use crate::error::TreeError;
use crate::ROOT_HEX_LEN;

/// Circom-compatible Poseidon hasher over the BN254 scalar field
pub struct PoseidonHash;

impl PoseidonHash {
    /// Hash two field elements into their parent node value
    pub fn hash_pair(left: &Fr, right: &Fr) -> Result<Fr, TreeError> {
        let mut poseidon = Poseidon::<Fr>::new_circom(2)?;
        Ok(poseidon.hash(&[*left, *right])?)
    }

    /// Encode raw leaf bytes into a field element
    ///
    /// The bytes are hashed with SHA-256 and the digest reduced into the
    /// field, so arbitrary-length input maps onto the full field domain.
    /// Truncating encodings collide on distinct leaves; this one does not.
    pub fn encode_leaf(data: &[u8]) -> Fr {
        let digest = Sha256::digest(data);
        Fr::from_be_bytes_mod_order(&digest)
    }

    /// Render a field element as 64 lowercase hex characters, left-padded
    pub fn to_hex(value: &Fr) -> String {
        hex::encode(value.into_bigint().to_bytes_be())
    }
}

/// Compare a root against an externally supplied hex commitment
///
/// The supplied string may carry a `0x` prefix, mixed case, and fewer than
/// 64 digits; it is normalized before the comparison. Strings that are not
/// hex, or wider than a field element, match nothing.
pub fn root_matches_hex(root: &Fr, supplied: &str) -> bool {
    let stripped = supplied.strip_prefix("0x").unwrap_or(supplied);
    if stripped.is_empty()
        || stripped.len() > ROOT_HEX_LEN
        || !stripped.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return false;
    }
    let mut normalized = String::with_capacity(ROOT_HEX_LEN);
    for _ in stripped.len()..ROOT_HEX_LEN {
        normalized.push('0');
    }
    normalized.push_str(&stripped.to_ascii_lowercase());
    PoseidonHash::to_hex(root) == normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[test]
    fn test_hash_pair_matches_circom_vector() {
        // poseidon(1, 2) from circomlibjs
        let hash = PoseidonHash::hash_pair(&Fr::from(1u64), &Fr::from(2u64)).unwrap();
        let expected: BigUint =
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
                .parse()
                .unwrap();
        assert_eq!(BigUint::from(hash.into_bigint()), expected);
    }

    #[test]
    fn test_hash_pair_deterministic_and_order_sensitive() {
        let a = PoseidonHash::encode_leaf(b"left");
        let b = PoseidonHash::encode_leaf(b"right");
        let h1 = PoseidonHash::hash_pair(&a, &b).unwrap();
        let h2 = PoseidonHash::hash_pair(&a, &b).unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, PoseidonHash::hash_pair(&b, &a).unwrap());
    }

    #[test]
    fn test_encode_leaf_deterministic() {
        assert_eq!(
            PoseidonHash::encode_leaf(b"payload"),
            PoseidonHash::encode_leaf(b"payload")
        );
        assert_ne!(
            PoseidonHash::encode_leaf(b"payload"),
            PoseidonHash::encode_leaf(b"payloae")
        );
        // arbitrary-length input is accepted
        let long = vec![0x5au8; 4096];
        assert_ne!(PoseidonHash::encode_leaf(&long), PoseidonHash::encode_leaf(b""));
    }

    #[test]
    fn test_to_hex_width() {
        assert_eq!(PoseidonHash::to_hex(&Fr::from(0u64)).len(), 64);
        let hex = PoseidonHash::to_hex(&Fr::from(0xabcu64));
        assert_eq!(hex.len(), 64);
        assert!(hex.ends_with("abc"));
        assert!(hex.starts_with('0'));
    }

    #[test]
    fn test_root_matches_hex_normalization() {
        let root = Fr::from(0xabcu64);
        assert!(root_matches_hex(&root, "abc"));
        assert!(root_matches_hex(&root, "0xABC"));
        assert!(root_matches_hex(&root, &PoseidonHash::to_hex(&root)));
        assert!(!root_matches_hex(&root, "abd"));
        assert!(!root_matches_hex(&root, ""));
        assert!(!root_matches_hex(&root, "0xzz"));
        let too_wide = "f".repeat(65);
        assert!(!root_matches_hex(&root, &too_wide));
    }
}
