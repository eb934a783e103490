//! Error types for commitment building.
//!
//! Every failure here is an input-contract violation or a failed checkpoint
//! write. Hashing itself cannot fail, so nothing in this enum is transient
//! and nothing is retried: callers abort the batch and publish nothing.

use thiserror::Error;

/// Errors that can occur while building a commitment or its proofs.
#[derive(Debug, Error)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("cannot build a merkle tree from an empty leaf set")]
    EmptyLeafSet,

    /// A proof was requested for a leaf that does not exist.
    #[error("leaf index {index} out of range (leaf count: {leaf_count})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of leaves in the tree.
        leaf_count: usize,
    },

    /// The address is empty or would make the leaf preimage ambiguous.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// The balance is not a non-negative integer that fits in a `u64`.
    #[error("invalid balance for {address}: {value}")]
    InvalidBalance {
        /// Address the balance belongs to.
        address: String,
        /// The offending value, as it appeared in the input.
        value: String,
    },

    /// A hex string did not decode to exactly 32 bytes, or a stored hash
    /// does not match its recomputation.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// The same address appears twice in an address-keyed proof book.
    #[error("duplicate address in proof book: {0}")]
    DuplicateAddress(String),

    /// The number of leaf records does not match the tree.
    #[error("leaf count mismatch: tree has {expected} leaves, got {got} records")]
    LeafCountMismatch {
        /// Leaves in the tree.
        expected: usize,
        /// Records supplied alongside it.
        got: usize,
    },

    /// An exchange snapshot is missing a required field or has the wrong shape.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A checkpoint sink reported a failure; the batch was aborted.
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MerkleError>;
