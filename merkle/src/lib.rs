// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # balance-merkle Core Library
//!
//! Commits a list of `(address, balance)` pairs to a single Keccak-256
//! Merkle root and hands every address an inclusion proof, so a claimant can
//! show their balance was in the snapshot without anyone publishing the
//! whole list on-chain.
//!
//! ## Architecture
//!
//! - **leaf**: `Keccak256(lowercase(address) ":" balance)`.
//! - **tree**: pairwise level building, root derivation, proof paths.
//! - **artifact**: the JSON records that cross the I/O boundary.
//! - **batch**: proofs for every leaf, with checkpoint callbacks.
//! - **snapshot**: balance extraction from an exchange state dump.
//! - **crypto**: Keccak-256 and hex helpers.
//! - **config**: every constant that affects commitment bytes.
//!
//! Nothing in this crate touches the filesystem. Callers hand in
//! in-memory sequences (or a reader) and get in-memory results back.
//!
//! ## Example
//!
//! ```
//! use balance_merkle::{build_root, generate_proof, BalanceEntry};
//!
//! let entries = vec![
//!     BalanceEntry::new("a", 10),
//!     BalanceEntry::new("b", 20),
//!     BalanceEntry::new("c", 30),
//! ];
//! let (root, leaves) = build_root(&entries).unwrap();
//! let hashes: Vec<_> = leaves.iter().map(|leaf| leaf.hash).collect();
//! let proof = generate_proof(2, &hashes).unwrap();
//! assert_eq!(proof.len(), 2);
//! assert_eq!(
//!     balance_merkle::crypto::to_hex(&root),
//!     "507fff97a90056a114339da26bf4b47a45f660f8745b2236ffd41d5e0dbb3179"
//! );
//! ```

pub mod artifact;
pub mod batch;
pub mod config;
pub mod crypto;
pub mod error;
pub mod leaf;
pub mod snapshot;
pub mod tree;

pub use artifact::{BalanceEntry, ProofBook, ProofRecord, RootRecord};
pub use batch::{CheckpointSink, NoCheckpoint, ProofBatch, Progress};
pub use crypto::Hash;
pub use error::{MerkleError, Result};
pub use leaf::{hash_leaf, Leaf};
pub use tree::{build_level, build_root, compute_root, generate_proof, MerkleTree};
