//! # Cryptographic Primitives
//!
//! Keccak-256 hashing and the hex conventions used by the persisted
//! artifacts. Everything here is a thin wrapper around the `sha3` crate.

pub mod hash;

pub use hash::{from_hex, hash_pair, keccak256, to_hex, to_prefixed_hex, Hash};
