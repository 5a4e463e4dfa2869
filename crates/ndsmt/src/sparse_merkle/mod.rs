// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! This module implements [`SparseMerkleTree`], an in-memory authenticated
//! dictionary over the full key space `[0, 2^depth)`. Nearly all leaves are
//! empty and represented implicitly: a node whose digest equals the default
//! digest of its level is simply not stored. The only mutation is insertion
//! of previously-absent keys; there is no deletion and no rollback.
//!
//! Besides the usual inclusion and non-inclusion proofs, the tree supports
//! batch insertion with a [`NonDeletionProof`]: one compact witness showing
//! both that a batch of leaves was previously unset and that the new root is
//! exactly the result of inserting them. See [`proof`] for the verifiers.
//!
//! [`NonDeletionProof`]: proof::NonDeletionProof

pub mod bit_path;
pub mod hash;
pub(crate) mod node_store;
pub mod proof;

#[cfg(test)]
pub(crate) mod bit_path_test;
#[cfg(test)]
pub(crate) mod test_helper;

use crate::insert_batch::InsertBatch;
use anyhow::{Result, bail, ensure};
use bit_path::BitPath;
use hash::{EMPTY_DIGEST, combine};
use node_store::NodeStore;
use primitive_types::{H256, U256};
use proof::{NonDeletionProof, SparseMerkleProof};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by the tree and the proof verifiers.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SmtError {
    /// Single-key insertion hit an occupied leaf slot. The tree is unchanged.
    #[error("the leaf '{0}' is already set")]
    LeafAlreadySet(BitPath),

    /// The key does not fit in the tree's key space.
    #[error("key {key} does not fit in {depth} bits")]
    InvalidKey { key: U256, depth: usize },

    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    ProofShape(String),

    /// The reconstructed root disagrees with the claimed root.
    #[error("reconstructed root {actual:x} does not match the expected root {expected:x}")]
    ProofMismatch { actual: H256, expected: H256 },
}

/// A sparse Merkle tree of fixed depth with batch-insertion consistency
/// proofs.
///
/// The tree is a pure value type: readers borrow it shared, writers
/// exclusively, and two trees never share state. All operations are
/// synchronous CPU work over the in-memory node store.
pub struct SparseMerkleTree {
    depth: usize,
    store: NodeStore,
}

impl SparseMerkleTree {
    /// Creates an empty tree over the key space `[0, 2^depth)`.
    pub fn new(depth: usize) -> Result<Self> {
        ensure!(
            (1..=256).contains(&depth),
            "tree depth must be in 1..=256, got {}",
            depth
        );
        Ok(Self {
            depth,
            store: NodeStore::new(depth),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The current root digest; `EMPTY_DIGEST` for an empty tree.
    pub fn get_root(&self) -> H256 {
        self.store.get(&BitPath::root())
    }

    /// The stored leaf digest of `key`, or `None` when the slot is empty.
    pub fn get(&self, key: U256) -> Result<Option<H256>> {
        let path = self.leaf_path(key)?;
        Ok(self.store.get_non_default(&path))
    }

    pub fn contains(&self, key: U256) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of non-default nodes currently stored.
    pub fn num_nodes(&self) -> usize {
        self.store.num_nodes()
    }

    /// Inserts `value` at `key` and returns the new root.
    ///
    /// Fails with [`SmtError::LeafAlreadySet`] when the slot is occupied
    /// (leaves are never overwritten) and leaves the tree unchanged.
    pub fn insert(&mut self, key: U256, value: H256) -> Result<H256> {
        ensure!(
            value != EMPTY_DIGEST,
            "cannot insert the empty digest as a leaf value"
        );
        let path = self.leaf_path(key)?;
        if self.store.contains(&path) {
            bail!(SmtError::LeafAlreadySet(path));
        }
        self.store.set(path.clone(), value);

        let mut node = path;
        let mut current = value;
        for _ in 0..self.depth {
            let sibling = self.store.get(&node.sibling());
            current = if node.last_bit() {
                combine(sibling, current)
            } else {
                combine(current, sibling)
            };
            node = node.parent();
            self.store.set(node.clone(), current);
        }
        Ok(current)
    }

    /// The long-form proof for `key`: every sibling digest along the walk
    /// from leaf to root, ascending by level, defaults included.
    pub fn sibling_digests(&self, key: U256) -> Result<Vec<H256>> {
        let mut node = self.leaf_path(key)?;
        let mut siblings = Vec::with_capacity(self.depth);
        for _ in 0..self.depth {
            siblings.push(self.store.get(&node.sibling()));
            node = node.parent();
        }
        Ok(siblings)
    }

    /// The compressed proof for `key`: a bitmap marking the levels with a
    /// non-default sibling, plus only those siblings.
    pub fn inclusion_proof(&self, key: U256) -> Result<SparseMerkleProof> {
        let mut node = self.leaf_path(key)?;
        let mut bitmap = U256::zero();
        let mut siblings = Vec::new();
        for level in 0..self.depth {
            let sibling = self.store.get(&node.sibling());
            if sibling != self.store.default_digest(level) {
                bitmap = bitmap | (U256::one() << level);
                siblings.push(sibling);
            }
            node = node.parent();
        }
        Ok(SparseMerkleProof::new(bitmap, siblings))
    }

    /// The same object as [`inclusion_proof`](Self::inclusion_proof): it
    /// proves the slot still holds the default leaf.
    pub fn non_inclusion_proof(&self, key: U256) -> Result<SparseMerkleProof> {
        self.inclusion_proof(key)
    }

    /// Inserts a batch of leaves and returns the non-deletion proof tying
    /// the old root to the new one.
    ///
    /// A key whose slot is already occupied (including a duplicate later in
    /// the same batch) is diagnosed and skipped; the rest of the batch
    /// proceeds. The proof digests are read after the leaves are written but
    /// before any interior node is recomputed, so they are the pre-batch
    /// digests of the untouched subtrees.
    pub fn batch_insert(&mut self, batch: InsertBatch) -> Result<NonDeletionProof> {
        // Validate the whole batch before writing anything; an invalid entry
        // must not leave the tree half-updated.
        let mut entries = Vec::with_capacity(batch.len());
        for (key, value) in batch {
            ensure!(
                value != EMPTY_DIGEST,
                "cannot insert the empty digest as a leaf value"
            );
            entries.push((self.leaf_path(key)?, value));
        }

        let mut inserted = Vec::with_capacity(entries.len());
        for (path, value) in entries {
            if self.store.contains(&path) {
                warn!("the leaf '{}' is already set, skipping", path);
                continue;
            }
            self.store.set(path.clone(), value);
            inserted.push(path);
        }

        let mut subtree_roots = BTreeMap::new();
        for path in untouched_subtree_roots(&inserted, self.depth) {
            if let Some(digest) = self.store.get_non_default(&path) {
                subtree_roots.insert(path, digest);
            }
        }

        // Recompute the affected interior nodes bottom-up, one level at a
        // time; prefixes shared between inserted leaves collapse in the set.
        for level in 1..=self.depth {
            let prefixes: BTreeSet<BitPath> = inserted
                .iter()
                .map(|path| path.prefix(self.depth - level))
                .collect();
            for prefix in prefixes {
                let digest = combine(
                    self.store.get(&prefix.child(false)),
                    self.store.get(&prefix.child(true)),
                );
                self.store.set(prefix, digest);
            }
        }

        Ok(NonDeletionProof::new(subtree_roots))
    }

    fn leaf_path(&self, key: U256) -> Result<BitPath> {
        BitPath::from_key(key, self.depth)
    }
}

/// Roots of the maximal subtrees containing none of `leaf_paths`: the union
/// of all root-ward siblings of the inserted paths, minus the paths
/// themselves, reduced to the elements that no other element strictly
/// extends.
fn untouched_subtree_roots(leaf_paths: &[BitPath], depth: usize) -> Vec<BitPath> {
    let mut siblings = BTreeSet::new();
    for path in leaf_paths {
        let mut node = path.clone();
        for _ in 0..depth {
            siblings.insert(node.sibling());
            node = node.parent();
        }
    }
    for path in leaf_paths {
        siblings.remove(path);
    }

    // `BitPath` orders a prefix immediately before its extensions, so one
    // sorted pass suffices: an element is extended by some other element iff
    // it is extended by its direct successor.
    let mut retained = Vec::new();
    let mut iter = siblings.iter().peekable();
    while let Some(path) = iter.next() {
        let extended = iter
            .peek()
            .is_some_and(|successor| path.is_strict_prefix_of(successor));
        if !extended {
            retained.push(path.clone());
        }
    }
    retained
}
