//! # Leaf Encoding
//!
//! A leaf commits to one `(address, balance)` pair:
//!
//! ```text
//! preimage = lowercase(address) ++ ":" ++ decimal(balance)
//! leaf     = Keccak256(utf8(preimage))
//! ```
//!
//! Lowercasing makes the commitment case-insensitive, so a checksummed
//! Ethereum address and its all-lowercase form land on the same leaf. The
//! balance is rendered by `u64`'s `Display`: no leading zeros, no
//! separators, and zero is the literal `"0"`.

use crate::config::LEAF_SEPARATOR;
use crate::crypto::hash::{keccak256, Hash};
use crate::error::{MerkleError, Result};

/// Build the exact textual preimage of a leaf.
pub fn leaf_preimage(address: &str, balance: u64) -> String {
    format!("{}{}{}", address.to_lowercase(), LEAF_SEPARATOR, balance)
}

/// Hash an `(address, balance)` pair into its 32-byte leaf.
///
/// Pure and total: it does not validate the address. Use [`Leaf::new`] when
/// the input comes from outside the process.
///
/// # Example
///
/// ```
/// use balance_merkle::leaf::hash_leaf;
///
/// assert_eq!(hash_leaf("0xABC", 7), hash_leaf("0xabc", 7));
/// ```
pub fn hash_leaf(address: &str, balance: u64) -> Hash {
    keccak256(leaf_preimage(address, balance).as_bytes())
}

/// Reject addresses that cannot be committed unambiguously.
///
/// An address must contain something other than whitespace and must not
/// contain the preimage separator; `"a:1" + ":" + "2"` and `"a" + ":" + "1:2"`
/// would otherwise collide.
pub fn validate_address(address: &str) -> Result<()> {
    if address.trim().is_empty() || address.contains(LEAF_SEPARATOR) {
        return Err(MerkleError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// One committed `(address, balance)` pair together with its leaf hash.
///
/// The address keeps the caller's original spelling, since it is echoed back
/// into the persisted artifacts; only the hash sees the lowercase form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    /// Address as supplied.
    pub address: String,
    /// Committed balance in base units.
    pub balance: u64,
    /// `hash_leaf(address, balance)`.
    pub hash: Hash,
}

impl Leaf {
    /// Validate the address and compute the leaf hash.
    pub fn new(address: impl Into<String>, balance: u64) -> Result<Self> {
        let address = address.into();
        validate_address(&address)?;
        let hash = hash_leaf(&address, balance);
        Ok(Self {
            address,
            balance,
            hash,
        })
    }
}
