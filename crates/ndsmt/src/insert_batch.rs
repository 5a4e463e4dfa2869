// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use primitive_types::{H256, U256};

/// An ordered batch of `(key, value)` insertions.
///
/// The batch keeps its insertion order: when the same key appears twice, the
/// first occurrence wins and the later one is diagnosed and skipped by
/// [`batch_insert`](crate::SparseMerkleTree::batch_insert).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InsertBatch {
    entries: Vec<(U256, H256)>,
}

impl InsertBatch {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a put operation to the batch.
    pub fn put(&mut self, key: U256, value: H256) {
        self.entries.push((key, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(U256, H256)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn as_slice(&self) -> &[(U256, H256)] {
        &self.entries
    }
}

impl IntoIterator for InsertBatch {
    type Item = (U256, H256);
    type IntoIter = std::vec::IntoIter<(U256, H256)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<(U256, H256)> for InsertBatch {
    fn from(entry: (U256, H256)) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

impl From<Vec<(U256, H256)>> for InsertBatch {
    fn from(entries: Vec<(U256, H256)>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(U256, H256)> for InsertBatch {
    fn from_iter<I: IntoIterator<Item = (U256, H256)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
