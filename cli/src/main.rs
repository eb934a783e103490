// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # balance-merkle
//!
//! Entry point for the `balance-merkle` binary. Parses CLI arguments,
//! initializes logging, and runs one of four subcommands:
//!
//! - `extract` pulls the top holders of a token out of a state snapshot
//! - `build` writes the Merkle root record and every inclusion proof
//! - `prove` prints the proof record of one leaf of a published root
//! - `version` prints build version information

mod cli;
mod logging;
mod store;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;

use balance_merkle::snapshot::{extract_from_reader, SnapshotFilter};
use balance_merkle::{
    build_root, generate_proof, BalanceEntry, MerkleTree, ProofBatch, ProofRecord, RootRecord,
};

use cli::{BalanceMerkleCli, Commands};
use logging::{LogFormat, DEFAULT_LOG_LEVEL};
use store::{FileCheckpoint, OutputPaths};

fn main() -> Result<()> {
    let cli = BalanceMerkleCli::parse();

    match cli.command {
        Commands::Extract(args) => {
            logging::init_logging(DEFAULT_LOG_LEVEL, LogFormat::from_str_lossy(&cli.log_format));
            extract(args)
        }
        Commands::Build(args) => {
            logging::init_logging(DEFAULT_LOG_LEVEL, LogFormat::from_str_lossy(&cli.log_format));
            build(args)
        }
        Commands::Prove(args) => {
            logging::init_logging(DEFAULT_LOG_LEVEL, LogFormat::from_str_lossy(&cli.log_format));
            prove(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Reads an exchange snapshot and writes the ranked balance list.
fn extract(args: cli::ExtractArgs) -> Result<()> {
    tracing::info!(
        snapshot = %args.snapshot.display(),
        token_id = args.token,
        top = args.top,
        "extracting balances"
    );

    let file = File::open(&args.snapshot)
        .with_context(|| format!("failed to open snapshot {}", args.snapshot.display()))?;
    let filter = SnapshotFilter {
        token_id: args.token,
        top_n: args.top,
    };
    let entries = extract_from_reader(BufReader::new(file), &filter)
        .with_context(|| format!("failed to extract balances from {}", args.snapshot.display()))?;

    store::write_json_atomic(&args.output, &entries)?;
    tracing::info!(count = entries.len(), path = %args.output.display(), "balance list written");

    println!("Extracted {} balances to {}", entries.len(), args.output.display());
    Ok(())
}

/// Commits the balance list to a root and publishes it with every inclusion
/// proof.
///
/// Checkpoints go to a staging file next to the proofs file. The proof book
/// and the root record are only written once every proof has been
/// generated, so a failed run publishes neither.
fn build(args: cli::BuildArgs) -> Result<()> {
    let entries: Vec<BalanceEntry> = store::read_json(&args.balances)?;
    tracing::info!(
        count = entries.len(),
        path = %args.balances.display(),
        "building merkle tree"
    );

    let (root, leaves) = build_root(&entries).context("failed to compute merkle root")?;
    let tree = MerkleTree::from_leaves(&leaves)?;
    let record = RootRecord::new(&root, &leaves);
    tracing::info!(root = %record.merkle_root, height = tree.height(), "merkle root computed");

    let batch = ProofBatch::new(&tree, &leaves)
        .context("failed to prepare proof batch")?
        .with_checkpoint_interval(args.checkpoint_interval);
    let mut sink = FileCheckpoint::new(store::staging_path(&args.proofs_out));
    let out = OutputPaths {
        root: &args.root_out,
        proofs: &args.proofs_out,
    };
    let book = store::publish_commitment(&batch, &record, out, &mut sink)?;
    tracing::info!(
        proofs = book.len(),
        root_path = %args.root_out.display(),
        proofs_path = %args.proofs_out.display(),
        "commitment published"
    );

    println!("Merkle root : 0x{}", record.merkle_root);
    println!("  Leaves    : {}", leaves.len());
    println!("  Height    : {}", tree.height());
    println!("  Root file : {}", args.root_out.display());
    println!("  Proofs    : {}", args.proofs_out.display());
    Ok(())
}

/// Reloads a root record and prints the proof record of one leaf.
fn prove(args: cli::ProveArgs) -> Result<()> {
    let record: RootRecord = store::read_json(&args.root)?;
    let (tree, leaves) = record
        .to_tree()
        .with_context(|| format!("root record {} is inconsistent", args.root.display()))?;

    let index = match (args.index, args.address.as_deref()) {
        (Some(index), _) => index,
        (None, Some(address)) => {
            let wanted = address.to_lowercase();
            match leaves
                .iter()
                .position(|leaf| leaf.address.to_lowercase() == wanted)
            {
                Some(index) => index,
                None => bail!("address {address} is not in {}", args.root.display()),
            }
        }
        (None, None) => bail!("either --index or --address is required"),
    };

    let proof = generate_proof(index, tree.leaf_hashes())?;
    let leaf = &leaves[index];
    tracing::info!(index, address = %leaf.address, levels = proof.len(), "proof generated");

    let out = serde_json::to_string_pretty(&ProofRecord::new(leaf, index, &proof))
        .context("failed to serialize proof record")?;
    println!("{out}");
    Ok(())
}

fn print_version() {
    println!("balance-merkle {}", env!("CARGO_PKG_VERSION"));
    println!("hash           {}", balance_merkle::config::HASH_FUNCTION);
}
