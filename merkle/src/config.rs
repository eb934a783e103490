//! # Commitment Constants
//!
//! Every constant that affects the bytes of a commitment lives here. Changing
//! any of them after a root has been published invalidates every proof that
//! was handed out against it, so treat this file as frozen.

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hash function for leaves and internal nodes.
pub const HASH_FUNCTION: &str = "Keccak-256";

/// Digest length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Separator between the lowercased address and the decimal balance in a
/// leaf preimage: `"<address>:<balance>"`.
pub const LEAF_SEPARATOR: char = ':';

/// Prefix carried by `leaf_hash` in proof records. Every other hex field is
/// written bare.
pub const HEX_PREFIX: &str = "0x";

// ---------------------------------------------------------------------------
// Batch Defaults
// ---------------------------------------------------------------------------

/// Number of proofs between checkpoint notifications.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 1_000;

// ---------------------------------------------------------------------------
// Snapshot Extraction
// ---------------------------------------------------------------------------

/// Token whose balances are committed by default (HYPE on the spot
/// clearinghouse).
pub const DEFAULT_TOKEN_ID: u64 = 150;

/// Number of top holders kept from a snapshot.
pub const DEFAULT_TOP_N: usize = 10_000;

/// JSON path to the per-user state array inside an exchange snapshot.
pub const SNAPSHOT_USER_STATES_PATH: [&str; 3] = ["exchange", "spot_clearinghouse", "user_states"];

// ---------------------------------------------------------------------------
// Artifact File Names
// ---------------------------------------------------------------------------

/// Default balance list consumed by `build`.
pub const DEFAULT_BALANCES_FILE: &str = "balances.json";

/// Default root record written by `build`.
pub const DEFAULT_ROOT_FILE: &str = "merkle_root.json";

/// Default proof book written by `build`.
pub const DEFAULT_PROOFS_FILE: &str = "merkle_proofs.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefix_shape() {
        assert_eq!(HEX_PREFIX.len(), 2);
        assert!(HEX_PREFIX.starts_with('0'));
    }

    #[test]
    fn test_separator_is_not_hex() {
        // The separator must never appear inside an address or a decimal
        // balance, or two different pairs could share a preimage.
        assert!(!LEAF_SEPARATOR.is_ascii_hexdigit());
    }

    #[test]
    fn test_batch_defaults_sanity() {
        assert!(DEFAULT_CHECKPOINT_INTERVAL > 0);
        assert!(DEFAULT_TOP_N > 0);
    }

    #[test]
    fn test_default_files_are_distinct() {
        assert_ne!(DEFAULT_BALANCES_FILE, DEFAULT_ROOT_FILE);
        assert_ne!(DEFAULT_ROOT_FILE, DEFAULT_PROOFS_FILE);
    }
}
