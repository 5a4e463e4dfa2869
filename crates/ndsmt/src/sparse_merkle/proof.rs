// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use super::SmtError;
use super::bit_path::BitPath;
use super::hash::{EMPTY_DIGEST, combine};
use anyhow::{Result, bail, ensure};
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A proof that can be used to authenticate a single leaf slot against a
/// trusted root hash.
///
/// The proof is the chain of sibling digests along the walk from the leaf to
/// the root, compressed: bit `level` of `bitmap` is set iff the sibling at
/// that level differs from the level default, and only those non-default
/// siblings appear in `siblings`, in ascending-level order. The same object
/// serves as an inclusion proof (the slot holds a given value) and a
/// non-inclusion proof (the slot still holds the default leaf); only the
/// starting digest of the reconstruction differs.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SparseMerkleProof {
    /// Bit `level` set iff the sibling at that level is non-default.
    bitmap: U256,
    /// The non-default siblings, bottom level first.
    siblings: Vec<H256>,
}

impl SparseMerkleProof {
    /// Constructs a new `SparseMerkleProof` from a bitmap and the matching
    /// sibling chain.
    pub fn new(bitmap: U256, siblings: Vec<H256>) -> Self {
        SparseMerkleProof { bitmap, siblings }
    }

    /// Compresses a long-form proof: all siblings along the leaf-to-root
    /// walk, ascending by level, defaults included.
    pub fn from_siblings(all_siblings: Vec<H256>) -> Self {
        let mut bitmap = U256::zero();
        let mut siblings = Vec::new();
        for (level, sibling) in all_siblings.into_iter().enumerate() {
            if sibling != EMPTY_DIGEST {
                bitmap = bitmap | (U256::one() << level);
                siblings.push(sibling);
            }
        }
        SparseMerkleProof { bitmap, siblings }
    }

    pub fn bitmap(&self) -> U256 {
        self.bitmap
    }

    /// Returns the list of non-default siblings in this proof.
    pub fn siblings(&self) -> &[H256] {
        &self.siblings
    }

    /// Folds the sibling chain over `starting` and returns the resulting
    /// root digest. At each level the key's bit (level 0 uses the least
    /// significant bit of the path) decides whether the running digest is
    /// the left or the right child.
    pub fn reconstruct_root(&self, depth: usize, key: U256, starting: H256) -> Result<H256> {
        let path = BitPath::from_key(key, depth)?;
        if depth < 256 {
            ensure!(
                self.bitmap >> depth == U256::zero(),
                SmtError::ProofShape(format!(
                    "bitmap has siblings at or above level {}",
                    depth
                ))
            );
        }
        let mut chain = self.siblings.iter();
        let mut current = starting;
        for level in 0..depth {
            let sibling = if self.bitmap.bit(level) {
                *chain.next().ok_or_else(|| {
                    SmtError::ProofShape(
                        "sibling chain is shorter than the bitmap requires".to_string(),
                    )
                })?
            } else {
                EMPTY_DIGEST
            };
            current = if path.bit(depth - 1 - level) {
                combine(sibling, current)
            } else {
                combine(current, sibling)
            };
        }
        ensure!(
            chain.next().is_none(),
            SmtError::ProofShape("sibling chain is longer than the bitmap requires".to_string())
        );
        Ok(current)
    }

    /// Verifies that the slot of `key` holds `value` in the tree with root
    /// `expected_root`.
    pub fn verify_inclusion(
        &self,
        depth: usize,
        key: U256,
        value: H256,
        expected_root: H256,
    ) -> Result<()> {
        ensure!(
            value != EMPTY_DIGEST,
            "an inclusion proof needs a non-empty leaf value"
        );
        self.check_root(depth, key, value, expected_root)
    }

    /// Verifies that the slot of `key` is still unset in the tree with root
    /// `expected_root`.
    pub fn verify_non_inclusion(&self, depth: usize, key: U256, expected_root: H256) -> Result<()> {
        self.check_root(depth, key, EMPTY_DIGEST, expected_root)
    }

    fn check_root(&self, depth: usize, key: U256, starting: H256, expected: H256) -> Result<()> {
        let actual = self.reconstruct_root(depth, key, starting)?;
        if actual != expected {
            bail!(SmtError::ProofMismatch { actual, expected });
        }
        Ok(())
    }
}

/// A proof that a batch insertion overwrote nothing.
///
/// The mapping holds the pre-batch digests of the maximal subtrees the batch
/// left untouched; default-valued subtrees are omitted and read back as
/// `EMPTY_DIGEST`. Because those subtrees are exactly the part of the tree
/// the batch did not change, the same digests reconstruct both roots: with
/// the batch leaves blanked out they yield the pre-batch root, and with the
/// real values they yield the post-batch root. The former succeeding is the
/// non-deletion guarantee: had any inserted slot held a value before the
/// batch, blanking it could not reproduce the old root.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NonDeletionProof {
    pub(crate) subtree_roots: BTreeMap<BitPath, H256>,
}

impl NonDeletionProof {
    pub(crate) fn new(subtree_roots: BTreeMap<BitPath, H256>) -> Self {
        NonDeletionProof { subtree_roots }
    }

    pub fn is_empty(&self) -> bool {
        self.subtree_roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subtree_roots.len()
    }

    pub fn get(&self, path: &BitPath) -> Option<H256> {
        self.subtree_roots.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BitPath, &H256)> {
        self.subtree_roots.iter()
    }

    /// Verifies that applying `batch` to the tree with root `old_root`
    /// produced `new_root` without overwriting any existing leaf.
    ///
    /// The batch is sorted by key, then the untouched forest is folded up
    /// twice: once with every inserted slot blanked to `EMPTY_DIGEST`
    /// (must reproduce `old_root`) and once with the real values (must
    /// reproduce `new_root`).
    pub fn verify(
        &self,
        depth: usize,
        old_root: H256,
        new_root: H256,
        batch: &[(U256, H256)],
    ) -> Result<()> {
        for path in self.subtree_roots.keys() {
            ensure!(
                !path.is_empty() && path.len() <= depth,
                SmtError::ProofShape(format!(
                    "subtree root '{}' is outside levels 1..={}",
                    path, depth
                ))
            );
        }

        let mut sorted = batch.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        let mut blanked = Vec::with_capacity(sorted.len());
        let mut filled = Vec::with_capacity(sorted.len());
        for (key, value) in sorted {
            let path = BitPath::from_key(key, depth)?;
            blanked.push((path.clone(), EMPTY_DIGEST));
            filled.push((path, value));
        }

        let actual_old = self.compute_forest(depth, blanked)?;
        if actual_old != old_root {
            debug!(
                "non-deletion proof reconstructed old root {:x}, claimed {:x}",
                actual_old, old_root
            );
            bail!(SmtError::ProofMismatch {
                actual: actual_old,
                expected: old_root,
            });
        }

        let actual_new = self.compute_forest(depth, filled)?;
        if actual_new != new_root {
            debug!(
                "non-deletion proof reconstructed new root {:x}, claimed {:x}",
                actual_new, new_root
            );
            bail!(SmtError::ProofMismatch {
                actual: actual_new,
                expected: new_root,
            });
        }
        Ok(())
    }

    /// Folds a sorted leaf layer up to the root, level by level.
    ///
    /// Computing from the leaves toward the root matters for security: the
    /// proof digests may only ever fill in siblings, never override a node
    /// derived from the supplied leaves. Two frontier entries that share a
    /// parent are adjacent in the sorted order and are consumed as a pair.
    fn compute_forest(&self, depth: usize, mut frontier: Vec<(BitPath, H256)>) -> Result<H256> {
        for _ in 0..depth {
            let mut next = Vec::with_capacity(frontier.len());
            let mut i = 0;
            while i < frontier.len() {
                let (path, digest) = frontier[i].clone();
                let last_bit = path.last_bit();
                let sibling = path.sibling();
                let sibling_digest = if !last_bit
                    && frontier
                        .get(i + 1)
                        .is_some_and(|(next_path, _)| *next_path == sibling)
                {
                    i += 1;
                    frontier[i].1
                } else {
                    self.subtree_roots
                        .get(&sibling)
                        .copied()
                        .unwrap_or(EMPTY_DIGEST)
                };
                let parent_digest = if last_bit {
                    combine(sibling_digest, digest)
                } else {
                    combine(digest, sibling_digest)
                };
                next.push((path.parent(), parent_digest));
                i += 1;
            }
            frontier = next;
        }
        ensure!(
            frontier.len() == 1,
            "the batch must fold to exactly one root (an empty batch cannot be verified)"
        );
        Ok(frontier[0].1)
    }
}
