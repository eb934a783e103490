//! # Hashing Utilities
//!
//! Every digest in this crate is Keccak-256: the original Keccak padding as
//! used by Ethereum, not the NIST-finalized SHA3-256. The two share a
//! permutation but produce different outputs, and the downstream verifier
//! recomputes leaves with Keccak-256, so this is not negotiable.
//!
//! Hashes travel as plain `[u8; 32]` arrays. Hex encoding comes in two
//! flavors because the persisted artifacts mix them: most fields are bare
//! lowercase hex, while `leaf_hash` in a proof record carries a `0x` prefix.

use sha3::{Digest, Keccak256};

use crate::config::{HASH_OUTPUT_LENGTH, HEX_PREFIX};
use crate::error::{MerkleError, Result};

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; HASH_OUTPUT_LENGTH];

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use balance_merkle::crypto::keccak256;
///
/// let hash = keccak256(b"a:10");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    finalize(hasher)
}

fn finalize(hasher: Keccak256) -> Hash {
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Hash an ordered pair of nodes into their parent.
///
/// The parent is `Keccak256(left || right)` over a single 64-byte buffer.
/// There is no domain-separation prefix and the children are never sorted,
/// so `hash_pair(a, b) != hash_pair(b, a)` for distinct `a`, `b`.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut buf = [0u8; 2 * HASH_OUTPUT_LENGTH];
    buf[..HASH_OUTPUT_LENGTH].copy_from_slice(left);
    buf[HASH_OUTPUT_LENGTH..].copy_from_slice(right);
    keccak256(&buf)
}

/// Lowercase hex without a prefix: exactly 64 characters.
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Lowercase hex with a `0x` prefix: exactly 66 characters.
pub fn to_prefixed_hex(hash: &Hash) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(hash))
}

/// Decode a 32-byte hash from hex, with or without a `0x` prefix.
///
/// Anything that is not valid hex or does not decode to exactly 32 bytes is
/// rejected. Upper-case digits are accepted on input even though this crate
/// only ever writes lowercase.
pub fn from_hex(s: &str) -> Result<Hash> {
    let digits = s.strip_prefix(HEX_PREFIX).unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| MerkleError::InvalidHash(format!("{s}: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        MerkleError::InvalidHash(format!(
            "{s}: expected {HASH_OUTPUT_LENGTH} bytes, got {}",
            bytes.len()
        ))
    })
}
