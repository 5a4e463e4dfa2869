// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use super::bit_path::BitPath;
use super::hash::default_digests;
use primitive_types::H256;
use std::collections::HashMap;

/// Sparse map from bit-path to digest.
///
/// The level of a node is derived from its path length (`depth - len`), so a
/// single map keyed by path covers the whole tree. Only digests that differ
/// from the level's default are stored; reading an absent entry yields the
/// default, and writing a default value removes the entry.
pub(crate) struct NodeStore {
    depth: usize,
    defaults: Vec<H256>,
    nodes: HashMap<BitPath, H256>,
}

impl NodeStore {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            defaults: default_digests(depth),
            nodes: HashMap::new(),
        }
    }

    /// The digest of an all-empty subtree of height `level`.
    pub fn default_digest(&self, level: usize) -> H256 {
        self.defaults[level]
    }

    pub fn get(&self, path: &BitPath) -> H256 {
        self.nodes
            .get(path)
            .copied()
            .unwrap_or_else(|| self.default_digest(self.depth - path.len()))
    }

    /// The stored digest, or `None` when the node holds its level default.
    pub fn get_non_default(&self, path: &BitPath) -> Option<H256> {
        self.nodes.get(path).copied()
    }

    pub fn contains(&self, path: &BitPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn set(&mut self, path: BitPath, digest: H256) {
        if digest == self.default_digest(self.depth - path.len()) {
            self.nodes.remove(&path);
        } else {
            self.nodes.insert(path, digest);
        }
    }

    /// Number of non-default nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BitPath, &H256)> {
        self.nodes.iter()
    }
}
