//! # Batch Proof Generation
//!
//! Walks every leaf of a tree in index order and fills a [`ProofBook`].
//! Proofs are computed a chunk at a time (in parallel inside a chunk when
//! the `parallel` feature is on), and after each full chunk a
//! [`CheckpointSink`] sees the partial book. Whatever the sink persists is a
//! checkpoint only: the caller must still write the complete book returned
//! by [`ProofBatch::run`].

use std::collections::HashSet;

use crate::artifact::{ProofBook, ProofRecord};
use crate::config::DEFAULT_CHECKPOINT_INTERVAL;
use crate::error::{MerkleError, Result};
use crate::leaf::Leaf;
use crate::tree::MerkleTree;

/// How far a batch has got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Proofs generated so far.
    pub processed: usize,
    /// Proofs the batch will generate in total.
    pub total: usize,
}

/// Receives the partial proof book after every full chunk.
///
/// Returning an error aborts the batch; the error is handed back from
/// [`ProofBatch::run`] unchanged.
pub trait CheckpointSink {
    fn checkpoint(&mut self, progress: Progress, book: &ProofBook) -> Result<()>;
}

impl<F> CheckpointSink for F
where
    F: FnMut(Progress, &ProofBook) -> Result<()>,
{
    fn checkpoint(&mut self, progress: Progress, book: &ProofBook) -> Result<()> {
        self(progress, book)
    }
}

/// A sink that ignores every checkpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCheckpoint;

impl CheckpointSink for NoCheckpoint {
    fn checkpoint(&mut self, _progress: Progress, _book: &ProofBook) -> Result<()> {
        Ok(())
    }
}

/// Generates the proof record of every leaf in a tree.
#[derive(Debug)]
pub struct ProofBatch<'a> {
    tree: &'a MerkleTree,
    leaves: &'a [Leaf],
    checkpoint_interval: usize,
}

impl<'a> ProofBatch<'a> {
    /// Pair a tree with the leaves it was built from.
    ///
    /// The leaves must be the same sequence, in the same order; their hashes
    /// are checked against the tree's leaf level. Addresses must be unique
    /// (exact match), since the proof book is keyed by address. Both checks
    /// run here so a bad input fails before the first checkpoint.
    pub fn new(tree: &'a MerkleTree, leaves: &'a [Leaf]) -> Result<Self> {
        if tree.leaf_count() != leaves.len() {
            return Err(MerkleError::LeafCountMismatch {
                expected: tree.leaf_count(),
                got: leaves.len(),
            });
        }
        if let Some((index, leaf)) = leaves
            .iter()
            .enumerate()
            .find(|(i, leaf)| tree.leaf_hashes()[*i] != leaf.hash)
        {
            return Err(MerkleError::InvalidHash(format!(
                "leaf {index} ({}) is not the tree's leaf at that index",
                leaf.address
            )));
        }

        let mut seen = HashSet::with_capacity(leaves.len());
        if let Some(leaf) = leaves.iter().find(|leaf| !seen.insert(leaf.address.as_str())) {
            return Err(MerkleError::DuplicateAddress(leaf.address.clone()));
        }

        Ok(Self {
            tree,
            leaves,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        })
    }

    /// Notify the sink every `interval` proofs. Zero disables checkpoints.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Generate every proof record, in leaf order.
    ///
    /// The sink is called `floor(total / interval)` times, never for a
    /// trailing partial chunk. Fails on the first duplicate address or sink
    /// error; no partial book is returned.
    pub fn run<S: CheckpointSink>(&self, sink: &mut S) -> Result<ProofBook> {
        let total = self.leaves.len();
        let mut book = ProofBook::with_capacity(total);

        let chunk = if self.checkpoint_interval == 0 {
            total
        } else {
            self.checkpoint_interval
        };

        let mut start = 0;
        while start < total {
            let end = (start + chunk).min(total);
            let proofs = self.tree.proofs_in(start..end)?;
            for (offset, proof) in proofs.iter().enumerate() {
                let index = start + offset;
                book.insert(ProofRecord::new(&self.leaves[index], index, proof))?;
            }

            if self.checkpoint_interval != 0 && end - start == self.checkpoint_interval {
                let progress = Progress {
                    processed: end,
                    total,
                };
                tracing::info!(processed = end, total, "proof checkpoint");
                sink.checkpoint(progress, &book)?;
            }
            start = end;
        }

        tracing::info!(proofs = book.len(), "all proofs generated");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::BalanceEntry;
    use crate::crypto::hash::to_hex;
    use crate::tree::build_root;

    fn fixture(n: usize) -> (MerkleTree, Vec<Leaf>) {
        let entries: Vec<BalanceEntry> = (0..n)
            .map(|i| BalanceEntry::new(format!("0x{i:040x}"), i as u64 * 10))
            .collect();
        let (_, leaves) = build_root(&entries).unwrap();
        let tree = MerkleTree::from_leaves(&leaves).unwrap();
        (tree, leaves)
    }

    #[test]
    fn test_run_produces_every_proof_in_order() {
        let (tree, leaves) = fixture(7);
        let book = ProofBatch::new(&tree, &leaves)
            .unwrap()
            .run(&mut NoCheckpoint)
            .unwrap();
        assert_eq!(book.len(), 7);
        for (index, record) in book.iter().enumerate() {
            assert_eq!(record.address, leaves[index].address);
            assert_eq!(record.inclusion_branches.index, index);
            let expected: Vec<String> = tree.proof(index).unwrap().iter().map(to_hex).collect();
            assert_eq!(record.inclusion_branches.proof, expected);
        }
    }

    #[test]
    fn test_checkpoint_count_is_floor() {
        let (tree, leaves) = fixture(25);
        let mut seen = Vec::new();
        let mut sink = |progress: Progress, book: &ProofBook| -> Result<()> {
            assert_eq!(book.len(), progress.processed);
            seen.push(progress);
            Ok(())
        };
        ProofBatch::new(&tree, &leaves)
            .unwrap()
            .with_checkpoint_interval(10)
            .run(&mut sink)
            .unwrap();
        assert_eq!(
            seen,
            vec![
                Progress {
                    processed: 10,
                    total: 25
                },
                Progress {
                    processed: 20,
                    total: 25
                },
            ]
        );
    }

    #[test]
    fn test_exact_multiple_checkpoints_at_end() {
        let (tree, leaves) = fixture(20);
        let mut calls = 0;
        let mut sink = |_: Progress, _: &ProofBook| -> Result<()> {
            calls += 1;
            Ok(())
        };
        ProofBatch::new(&tree, &leaves)
            .unwrap()
            .with_checkpoint_interval(10)
            .run(&mut sink)
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_zero_interval_disables_checkpoints() {
        let (tree, leaves) = fixture(5);
        let mut calls = 0;
        let mut sink = |_: Progress, _: &ProofBook| -> Result<()> {
            calls += 1;
            Ok(())
        };
        let book = ProofBatch::new(&tree, &leaves)
            .unwrap()
            .with_checkpoint_interval(0)
            .run(&mut sink)
            .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(book.len(), 5);
    }

    #[test]
    fn test_sink_failure_aborts() {
        let (tree, leaves) = fixture(30);
        let mut calls = 0;
        let mut sink = |_: Progress, _: &ProofBook| -> Result<()> {
            calls += 1;
            Err(MerkleError::Checkpoint("disk full".into()))
        };
        let err = ProofBatch::new(&tree, &leaves)
            .unwrap()
            .with_checkpoint_interval(10)
            .run(&mut sink)
            .unwrap_err();
        assert!(matches!(err, MerkleError::Checkpoint(msg) if msg == "disk full"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_duplicate_address_fails_batch() {
        let entries = vec![
            BalanceEntry::new("0xaa", 1),
            BalanceEntry::new("0xbb", 2),
            BalanceEntry::new("0xaa", 3),
        ];
        let (_, leaves) = build_root(&entries).unwrap();
        let tree = MerkleTree::from_leaves(&leaves).unwrap();
        let err = ProofBatch::new(&tree, &leaves).unwrap_err();
        assert!(matches!(err, MerkleError::DuplicateAddress(a) if a == "0xaa"));
    }

    #[test]
    fn test_duplicate_address_fails_before_any_checkpoint() {
        // The duplicate sits after two full chunks.
        let mut entries: Vec<BalanceEntry> = (0..12)
            .map(|i| BalanceEntry::new(format!("0x{i:x}"), i as u64 + 1))
            .collect();
        entries.push(BalanceEntry::new("0x0", 99));
        let (_, leaves) = build_root(&entries).unwrap();
        let tree = MerkleTree::from_leaves(&leaves).unwrap();

        let mut calls = 0;
        let mut sink = |_: Progress, _: &ProofBook| -> Result<()> {
            calls += 1;
            Ok(())
        };
        let result = ProofBatch::new(&tree, &leaves)
            .map(|batch| batch.with_checkpoint_interval(5))
            .and_then(|batch| batch.run(&mut sink));
        assert!(matches!(result, Err(MerkleError::DuplicateAddress(_))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_case_variants_are_distinct_keys() {
        let entries = vec![BalanceEntry::new("0xAA", 1), BalanceEntry::new("0xaa", 2)];
        let (_, leaves) = build_root(&entries).unwrap();
        let tree = MerkleTree::from_leaves(&leaves).unwrap();
        let book = ProofBatch::new(&tree, &leaves)
            .unwrap()
            .run(&mut NoCheckpoint)
            .unwrap();
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_mismatched_leaves_rejected() {
        let (tree, leaves) = fixture(4);
        assert!(matches!(
            ProofBatch::new(&tree, &leaves[..3]),
            Err(MerkleError::LeafCountMismatch {
                expected: 4,
                got: 3
            })
        ));

        let mut swapped = leaves.clone();
        swapped.swap(0, 1);
        assert!(matches!(
            ProofBatch::new(&tree, &swapped),
            Err(MerkleError::InvalidHash(_))
        ));
    }
}
