//! # Binary Merkle Tree
//!
//! Levels are built pairwise, left to right:
//!
//! ```text
//! level 2:            H(H(A,B), H(C,C))              <- root
//!                    /                  \
//! level 1:      H(A,B)                H(C,C)
//!               /    \                /    \
//! level 0:     A      B              C    (C)        <- leaves
//! ```
//!
//! A parent is `Keccak256(left || right)`. When a level has an odd number of
//! nodes, the last one is paired with itself. A single leaf is its own root;
//! nothing is hashed.
//!
//! Proofs list one sibling per level, bottom up. The verifier needs the leaf
//! index as well: bit `k` of the index says whether the running hash was the
//! left (0) or right (1) argument at level `k`. A proof entry that equals the
//! running hash is the self-duplicate of an odd level's last node, not a
//! bug.

use std::ops::Range;

use crate::artifact::BalanceEntry;
use crate::crypto::hash::{hash_pair, Hash};
use crate::error::{MerkleError, Result};
use crate::leaf::Leaf;

/// Build the next level up from `nodes`.
///
/// Returns `ceil(nodes.len() / 2)` parents in pairing order. An empty input
/// yields an empty level.
pub fn build_level(nodes: &[Hash]) -> Vec<Hash> {
    nodes
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            // Odd level: the unpaired last node is its own sibling.
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

/// Derive the root by applying [`build_level`] until one node remains.
pub fn compute_root(leaf_hashes: &[Hash]) -> Result<Hash> {
    let mut current = leaf_hashes.to_vec();
    while current.len() > 1 {
        current = build_level(&current);
    }
    current.first().copied().ok_or(MerkleError::EmptyLeafSet)
}

/// Encode every entry as a leaf and derive the root over them.
///
/// Leaves come back in input order, which is also leaf-index order. Fails on
/// an empty input or the first invalid address; nothing partial is returned.
pub fn build_root(entries: &[BalanceEntry]) -> Result<(Hash, Vec<Leaf>)> {
    let leaves = entries
        .iter()
        .map(|entry| Leaf::new(entry.address.as_str(), entry.balance))
        .collect::<Result<Vec<_>>>()?;
    let hashes: Vec<Hash> = leaves.iter().map(|leaf| leaf.hash).collect();
    let root = compute_root(&hashes)?;

    tracing::debug!(leaves = leaves.len(), "root derived");
    Ok((root, leaves))
}

/// Generate the inclusion proof for `index` by re-walking every level.
///
/// Independent of [`MerkleTree`]: each call rebuilds the levels from the
/// leaf hashes. Prefer [`MerkleTree::proof`] when proving many leaves.
pub fn generate_proof(index: usize, leaf_hashes: &[Hash]) -> Result<Vec<Hash>> {
    check_index(index, leaf_hashes.len())?;

    let mut proof = Vec::new();
    let mut current_level = leaf_hashes.to_vec();
    let mut current_index = index;

    while current_level.len() > 1 {
        let sibling_index = if current_index % 2 == 0 {
            current_index + 1
        } else {
            current_index - 1
        };

        let sibling = current_level
            .get(sibling_index)
            .unwrap_or(&current_level[current_index]);
        proof.push(*sibling);

        current_level = build_level(&current_level);
        current_index /= 2;
    }

    Ok(proof)
}

fn check_index(index: usize, leaf_count: usize) -> Result<()> {
    if index >= leaf_count {
        return Err(MerkleError::IndexOutOfRange { index, leaf_count });
    }
    Ok(())
}

/// An immutable table of every level, from the leaves up to the root.
///
/// Built once; proofs are then read straight out of the table. The tree
/// holds no interior mutability, so a shared reference can serve proofs
/// from any number of threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` are the leaf hashes, `levels.last()` is `[root]`.
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build every level above `leaf_hashes`.
    pub fn from_leaf_hashes(leaf_hashes: Vec<Hash>) -> Result<Self> {
        if leaf_hashes.is_empty() {
            return Err(MerkleError::EmptyLeafSet);
        }

        let mut levels = vec![leaf_hashes];
        while let Some(top) = levels.last().filter(|level| level.len() > 1) {
            let next = build_level(top);
            tracing::debug!(level = levels.len(), nodes = next.len(), "level built");
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// Build a tree over already-encoded leaves, in order.
    pub fn from_leaves(leaves: &[Leaf]) -> Result<Self> {
        Self::from_leaf_hashes(leaves.iter().map(|leaf| leaf.hash).collect())
    }

    /// The committed root.
    pub fn root(&self) -> Hash {
        // Construction guarantees a final level with exactly one node.
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels above the leaves; also the length of every proof.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// The leaf hashes.
    pub fn leaf_hashes(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// Same output as [`generate_proof`] over the same leaves.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        check_index(index, self.leaf_count())?;
        Ok(self.path(index))
    }

    /// Proofs for every leaf in `range`, in index order.
    ///
    /// Computed in parallel when the `parallel` feature is enabled; the
    /// output is identical either way.
    pub fn proofs_in(&self, range: Range<usize>) -> Result<Vec<Vec<Hash>>> {
        if range.end > self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange {
                index: range.end - 1,
                leaf_count: self.leaf_count(),
            });
        }

        #[cfg(feature = "parallel")]
        let proofs: Vec<Vec<Hash>> = {
            use rayon::prelude::*;
            range.into_par_iter().map(|index| self.path(index)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let proofs: Vec<Vec<Hash>> = range.map(|index| self.path(index)).collect();

        Ok(proofs)
    }

    /// Proofs for every leaf, in index order.
    pub fn proofs(&self) -> Vec<Vec<Hash>> {
        #[cfg(feature = "parallel")]
        let proofs: Vec<Vec<Hash>> = {
            use rayon::prelude::*;
            (0..self.leaf_count())
                .into_par_iter()
                .map(|index| self.path(index))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let proofs: Vec<Vec<Hash>> = (0..self.leaf_count())
            .map(|index| self.path(index))
            .collect();

        proofs
    }

    /// Walk the cached levels; `index` must already be in range.
    fn path(&self, mut index: usize) -> Vec<Hash> {
        let mut proof = Vec::with_capacity(self.height());
        for level in &self.levels[..self.height()] {
            let sibling = level.get(index ^ 1).unwrap_or(&level[index]);
            proof.push(*sibling);
            index /= 2;
        }
        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;
    use crate::leaf::hash_leaf;

    fn leaves(n: usize) -> Vec<Hash> {
        (0..n).map(|i| keccak256(&i.to_le_bytes())).collect()
    }

    /// Positional replay: bit k of the index picks the argument order.
    fn replay(leaf: Hash, index: usize, proof: &[Hash]) -> Hash {
        proof.iter().enumerate().fold(leaf, |acc, (k, sibling)| {
            if (index >> k) & 1 == 0 {
                hash_pair(&acc, sibling)
            } else {
                hash_pair(sibling, &acc)
            }
        })
    }

    #[test]
    fn test_build_level_even() {
        let l = leaves(4);
        assert_eq!(
            build_level(&l),
            vec![hash_pair(&l[0], &l[1]), hash_pair(&l[2], &l[3])]
        );
    }

    #[test]
    fn test_build_level_odd_duplicates_last() {
        let l = leaves(3);
        assert_eq!(
            build_level(&l),
            vec![hash_pair(&l[0], &l[1]), hash_pair(&l[2], &l[2])]
        );
    }

    #[test]
    fn test_build_level_lengths() {
        for n in 1..=9 {
            assert_eq!(build_level(&leaves(n)).len(), n.div_ceil(2));
        }
        assert!(build_level(&[]).is_empty());
    }

    #[test]
    fn test_compute_root_single_leaf_is_leaf() {
        let leaf = hash_leaf("solo", 1);
        assert_eq!(compute_root(&[leaf]).unwrap(), leaf);
    }

    #[test]
    fn test_compute_root_empty_fails() {
        assert!(matches!(compute_root(&[]), Err(MerkleError::EmptyLeafSet)));
    }

    #[test]
    fn test_compute_root_three_leaves() {
        let l = leaves(3);
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[2]));
        assert_eq!(compute_root(&l).unwrap(), expected);
    }

    #[test]
    fn test_tree_matches_compute_root() {
        for n in 1..=33 {
            let l = leaves(n);
            let tree = MerkleTree::from_leaf_hashes(l.clone()).unwrap();
            assert_eq!(tree.root(), compute_root(&l).unwrap(), "n = {n}");
            assert_eq!(tree.leaf_count(), n);
        }
    }

    #[test]
    fn test_tree_height_is_ceil_log2() {
        for (n, height) in [(1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (16, 4), (17, 5)] {
            let tree = MerkleTree::from_leaf_hashes(leaves(n)).unwrap();
            assert_eq!(tree.height(), height, "n = {n}");
            assert_eq!(tree.levels().len(), height + 1);
        }
    }

    #[test]
    fn test_tree_empty_fails() {
        assert!(matches!(
            MerkleTree::from_leaf_hashes(Vec::new()),
            Err(MerkleError::EmptyLeafSet)
        ));
    }

    #[test]
    fn test_single_leaf_proof_is_empty() {
        let l = leaves(1);
        assert!(generate_proof(0, &l).unwrap().is_empty());
        let tree = MerkleTree::from_leaf_hashes(l).unwrap();
        assert!(tree.proof(0).unwrap().is_empty());
    }

    #[test]
    fn test_proof_round_trip_all_sizes() {
        for n in [1, 2, 3, 4, 5, 16, 17] {
            let l = leaves(n);
            let root = compute_root(&l).unwrap();
            for (i, leaf) in l.iter().enumerate() {
                let proof = generate_proof(i, &l).unwrap();
                assert_eq!(replay(*leaf, i, &proof), root, "n = {n}, i = {i}");
            }
        }
    }

    #[test]
    fn test_cached_proof_matches_rewalk() {
        for n in 1..=40 {
            let l = leaves(n);
            let tree = MerkleTree::from_leaf_hashes(l.clone()).unwrap();
            for i in 0..n {
                assert_eq!(tree.proof(i).unwrap(), generate_proof(i, &l).unwrap());
            }
        }
    }

    #[test]
    fn test_odd_last_leaf_gets_self_duplicate() {
        let l = leaves(3);
        let proof = generate_proof(2, &l).unwrap();
        assert_eq!(proof[0], l[2], "sibling of an unpaired node is itself");
        assert_eq!(proof[1], hash_pair(&l[0], &l[1]));
    }

    #[test]
    fn test_odd_count_at_upper_level() {
        // 5 leaves: level 1 has 3 nodes, so leaf 4's parent is unpaired too.
        let l = leaves(5);
        let level1 = build_level(&l);
        let proof = generate_proof(4, &l).unwrap();
        assert_eq!(proof.len(), 3);
        assert_eq!(proof[0], l[4]);
        assert_eq!(proof[1], level1[2]);
    }

    #[test]
    fn test_proof_length_power_of_two_is_uniform() {
        let tree = MerkleTree::from_leaf_hashes(leaves(16)).unwrap();
        for i in 0..16 {
            assert_eq!(tree.proof(i).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let l = leaves(4);
        assert!(matches!(
            generate_proof(4, &l),
            Err(MerkleError::IndexOutOfRange {
                index: 4,
                leaf_count: 4
            })
        ));
        let tree = MerkleTree::from_leaf_hashes(l).unwrap();
        assert!(tree.proof(99).is_err());
        assert!(generate_proof(0, &[]).is_err());
    }

    #[test]
    fn test_proofs_matches_single_proofs() {
        let tree = MerkleTree::from_leaf_hashes(leaves(17)).unwrap();
        let all = tree.proofs();
        assert_eq!(all.len(), 17);
        for (i, proof) in all.iter().enumerate() {
            assert_eq!(proof, &tree.proof(i).unwrap());
        }
    }

    #[test]
    fn test_proofs_in_range() {
        let tree = MerkleTree::from_leaf_hashes(leaves(10)).unwrap();
        let chunk = tree.proofs_in(3..7).unwrap();
        assert_eq!(chunk.len(), 4);
        assert_eq!(chunk[0], tree.proof(3).unwrap());
        assert_eq!(chunk[3], tree.proof(6).unwrap());
        assert!(tree.proofs_in(8..11).is_err());
        assert!(tree.proofs_in(4..4).unwrap().is_empty());
    }

    #[test]
    fn test_build_root_keeps_order_and_spelling() {
        let entries = vec![
            BalanceEntry::new("0xAA", 1),
            BalanceEntry::new("0xbb", 2),
        ];
        let (root, leaves) = build_root(&entries).unwrap();
        assert_eq!(leaves[0].address, "0xAA");
        assert_eq!(leaves[1].address, "0xbb");
        assert_eq!(root, hash_pair(&hash_leaf("0xaa", 1), &hash_leaf("0xbb", 2)));
    }

    #[test]
    fn test_build_root_rejects_bad_entries() {
        assert!(matches!(build_root(&[]), Err(MerkleError::EmptyLeafSet)));
        let entries = vec![BalanceEntry::new("ok", 1), BalanceEntry::new("", 2)];
        assert!(matches!(
            build_root(&entries),
            Err(MerkleError::InvalidAddress(_))
        ));
    }
}
