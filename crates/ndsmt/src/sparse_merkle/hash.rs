// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use primitive_types::H256;
use sha2::{Digest, Sha256};

/// The digest of an absent leaf, and therefore of any completely empty subtree.
pub const EMPTY_DIGEST: H256 = H256([0u8; 32]);

/// Combines two child digests into their parent digest.
///
/// An `EMPTY_DIGEST` slot is transparent: combining a digest with an empty
/// subtree yields the digest itself. This keeps the digest of a one-leaf
/// subtree equal to that leaf's value, which the proof verifiers rely on, and
/// skips hashing along long empty spines. Changing this special case breaks
/// every proof in the crate.
pub fn combine(left: H256, right: H256) -> H256 {
    if left == EMPTY_DIGEST {
        return right;
    }
    if right == EMPTY_DIGEST {
        return left;
    }
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    H256::from_slice(hasher.finalize().as_slice())
}

/// Digests of the all-empty subtree for each level `0..=depth`.
pub(crate) fn default_digests(depth: usize) -> Vec<H256> {
    let mut table = Vec::with_capacity(depth + 1);
    table.push(EMPTY_DIGEST);
    for level in 1..=depth {
        let child = table[level - 1];
        table.push(combine(child, child));
    }
    table
}
