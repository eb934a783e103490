//! # CLI Interface
//!
//! Defines the command-line argument structure for `balance-merkle` using
//! `clap` derive. Supports four subcommands: `extract`, `build`, `prove`,
//! and `version`.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use balance_merkle::config::{
    DEFAULT_BALANCES_FILE, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_PROOFS_FILE, DEFAULT_ROOT_FILE,
    DEFAULT_TOKEN_ID, DEFAULT_TOP_N,
};

/// Balance snapshot Merkle builder.
///
/// Commits a list of address balances to a Keccak-256 Merkle root and
/// writes an inclusion proof for every address.
#[derive(Parser, Debug)]
#[command(
    name = "balance-merkle",
    about = "Balance snapshot Merkle builder",
    version,
    propagate_version = true
)]
pub struct BalanceMerkleCli {
    /// Log output format: `pretty` or `json`. Logs always go to stderr.
    #[arg(long, global = true, env = "MERKLE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the top holders of a token from an exchange state snapshot.
    Extract(ExtractArgs),
    /// Build the Merkle root and the proof for every address.
    Build(BuildArgs),
    /// Print the proof record of one leaf from a published root file.
    Prove(ProveArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `extract` subcommand.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Exchange state snapshot (JSON).
    #[arg(long, short = 's', env = "MERKLE_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Where to write the balance list.
    #[arg(long, short = 'o', env = "MERKLE_BALANCES", default_value = DEFAULT_BALANCES_FILE)]
    pub output: PathBuf,

    /// Token id to extract.
    #[arg(long, default_value_t = DEFAULT_TOKEN_ID)]
    pub token: u64,

    /// Number of top holders to keep.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,
}

/// Arguments for the `build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Balance list: a JSON array of `{address, balance}`.
    #[arg(long, short = 'b', env = "MERKLE_BALANCES", default_value = DEFAULT_BALANCES_FILE)]
    pub balances: PathBuf,

    /// Where to write the root record.
    #[arg(long, env = "MERKLE_ROOT_FILE", default_value = DEFAULT_ROOT_FILE)]
    pub root_out: PathBuf,

    /// Where to write the proof book.
    #[arg(long, env = "MERKLE_PROOFS_FILE", default_value = DEFAULT_PROOFS_FILE)]
    pub proofs_out: PathBuf,

    /// Rewrite the partial proof book every N proofs. Zero disables
    /// checkpoints; the complete book is always written at the end.
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_INTERVAL)]
    pub checkpoint_interval: usize,
}

/// Arguments for the `prove` subcommand.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["index", "address"])))]
pub struct ProveArgs {
    /// Root record written by `build`.
    #[arg(long, short = 'r', env = "MERKLE_ROOT_FILE", default_value = DEFAULT_ROOT_FILE)]
    pub root: PathBuf,

    /// Leaf index to prove.
    #[arg(long, short = 'i')]
    pub index: Option<usize>,

    /// Address to prove (case-insensitive).
    #[arg(long, short = 'a')]
    pub address: Option<String>,
}
