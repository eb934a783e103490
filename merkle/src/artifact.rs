//! # Persisted Artifact Records
//!
//! The JSON shapes that cross the I/O boundary. Field names, hex prefixes
//! and the address-keyed proof book all follow the files the downstream
//! claim program already consumes:
//!
//! ```text
//! balances.json       [{"address": "0x..", "balance": "123"}, ...]
//! merkle_root.json    {"merkle_root": "<hex>", "leaves": [{"address", "balance", "hash"}]}
//! merkle_proofs.json  {"0x..": {"address", "balance", "leaf_hash": "0x<hex>",
//!                               "inclusion_branches": {"index", "proof": ["<hex>"]}}}
//! ```
//!
//! Only `leaf_hash` carries a `0x` prefix. Everything else is bare
//! lowercase hex.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::crypto::hash::{from_hex, to_hex, to_prefixed_hex, Hash};
use crate::error::{MerkleError, Result};
use crate::leaf::Leaf;
use crate::tree::MerkleTree;

// ---------------------------------------------------------------------------
// Balances
// ---------------------------------------------------------------------------

/// Parse a balance that may arrive as a JSON integer or a string of digits.
///
/// Floats, negatives, signs, separators and anything above `u64::MAX` are
/// rejected instead of being rounded into a different commitment.
pub fn parse_balance(address: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<u64>().ok()
        }
        _ => None,
    };

    parsed.ok_or_else(|| MerkleError::InvalidBalance {
        address: address.to_string(),
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

/// One input row: an address and the balance to commit for it.
///
/// Deserializes from either numeric form accepted by [`parse_balance`] and
/// serializes the balance back as a decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBalanceEntry", into = "RawBalanceEntry")]
pub struct BalanceEntry {
    /// Account address, any case.
    pub address: String,
    /// Balance in base units.
    pub balance: u64,
}

impl BalanceEntry {
    /// Create an entry.
    pub fn new(address: impl Into<String>, balance: u64) -> Self {
        Self {
            address: address.into(),
            balance,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawBalanceEntry {
    address: String,
    balance: Value,
}

impl TryFrom<RawBalanceEntry> for BalanceEntry {
    type Error = MerkleError;

    fn try_from(raw: RawBalanceEntry) -> Result<Self> {
        let balance = parse_balance(&raw.address, &raw.balance)?;
        Ok(Self {
            address: raw.address,
            balance,
        })
    }
}

impl From<BalanceEntry> for RawBalanceEntry {
    fn from(entry: BalanceEntry) -> Self {
        Self {
            address: entry.address,
            balance: Value::String(entry.balance.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Root record
// ---------------------------------------------------------------------------

/// A leaf as written into the root record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    /// Address as given in the balance list.
    pub address: String,
    /// Committed balance, written as a JSON integer.
    pub balance: u64,
    /// Leaf hash, bare lowercase hex.
    pub hash: String,
}

impl From<&Leaf> for LeafRecord {
    fn from(leaf: &Leaf) -> Self {
        Self {
            address: leaf.address.clone(),
            balance: leaf.balance,
            hash: to_hex(&leaf.hash),
        }
    }
}

/// The published commitment together with every leaf, in index order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    /// Root hash, bare lowercase hex.
    pub merkle_root: String,
    /// Every leaf, in leaf-index order.
    pub leaves: Vec<LeafRecord>,
}

impl RootRecord {
    /// Record `root` together with the leaves it was derived from.
    pub fn new(root: &Hash, leaves: &[Leaf]) -> Self {
        Self {
            merkle_root: to_hex(root),
            leaves: leaves.iter().map(LeafRecord::from).collect(),
        }
    }

    /// Decode the stored root.
    pub fn root(&self) -> Result<Hash> {
        from_hex(&self.merkle_root)
    }

    /// Re-encode every leaf and check it against the stored hash.
    pub fn to_leaves(&self) -> Result<Vec<Leaf>> {
        self.leaves
            .iter()
            .map(|record| {
                let leaf = Leaf::new(record.address.as_str(), record.balance)?;
                if from_hex(&record.hash)? != leaf.hash {
                    return Err(MerkleError::InvalidHash(format!(
                        "stored leaf hash for {} does not match its recomputation",
                        record.address
                    )));
                }
                Ok(leaf)
            })
            .collect()
    }

    /// Rebuild the tree from the stored leaves and check it reproduces the
    /// stored root.
    pub fn to_tree(&self) -> Result<(MerkleTree, Vec<Leaf>)> {
        let leaves = self.to_leaves()?;
        let tree = MerkleTree::from_leaves(&leaves)?;
        if tree.root() != self.root()? {
            return Err(MerkleError::InvalidHash(format!(
                "stored root {} does not match the root of its leaves {}",
                self.merkle_root,
                to_hex(&tree.root())
            )));
        }
        Ok((tree, leaves))
    }
}

// ---------------------------------------------------------------------------
// Proof records
// ---------------------------------------------------------------------------

/// Leaf index plus the sibling path, bottom up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionBranches {
    /// Leaf index; bit `k` selects the hashing order at level `k`.
    pub index: usize,
    /// Bare lowercase hex, one entry per level above the leaves.
    pub proof: Vec<String>,
}

/// Everything a claimant needs to prove membership of one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    /// Address as given in the balance list; also the proof book key.
    pub address: String,
    /// Committed balance.
    pub balance: u64,
    /// `0x`-prefixed lowercase hex.
    pub leaf_hash: String,
    pub inclusion_branches: InclusionBranches,
}

impl ProofRecord {
    /// Build the record for `leaf` at `index` from its sibling path.
    pub fn new(leaf: &Leaf, index: usize, proof: &[Hash]) -> Self {
        Self {
            address: leaf.address.clone(),
            balance: leaf.balance,
            leaf_hash: to_prefixed_hex(&leaf.hash),
            inclusion_branches: InclusionBranches {
                index,
                proof: proof.iter().map(to_hex).collect(),
            },
        }
    }
}

/// Proof records keyed by address, serialized as one JSON object in leaf
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProofBook {
    records: Vec<ProofRecord>,
    by_address: HashMap<String, usize>,
}

impl ProofBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty book with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            by_address: HashMap::with_capacity(capacity),
        }
    }

    /// Append a record. The address must not already be present: a keyed
    /// book cannot hold both, and silently keeping one would publish a proof
    /// set that omits a committed leaf.
    pub fn insert(&mut self, record: ProofRecord) -> Result<()> {
        if self.by_address.contains_key(&record.address) {
            return Err(MerkleError::DuplicateAddress(record.address));
        }
        self.by_address
            .insert(record.address.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Look up a record by exact address.
    pub fn get(&self, address: &str) -> Option<&ProofRecord> {
        self.by_address.get(address).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in leaf order.
    pub fn iter(&self) -> impl Iterator<Item = &ProofRecord> {
        self.records.iter()
    }
}

impl Serialize for ProofBook {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.records.iter().map(|r| (&r.address, r)))
    }
}
