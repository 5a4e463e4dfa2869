// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use super::bit_path::BitPath;
use primitive_types::{H256, U256};
use rand::{Rng, rngs::StdRng};
use std::collections::HashSet;

/// Builds a path from a literal bit string such as `"0101"`.
pub(crate) fn path(bits: &str) -> BitPath {
    bits.chars().fold(BitPath::root(), |path, c| {
        assert!(c == '0' || c == '1', "not a bit string: {}", bits);
        path.child(c == '1')
    })
}

pub(crate) fn digest(value: u64) -> H256 {
    H256::from_low_u64_be(value)
}

/// Draws `count` distinct 32-bit keys (also distinct from `taken`) with
/// non-empty random values.
pub(crate) fn random_entries(
    rng: &mut StdRng,
    count: usize,
    taken: &mut HashSet<U256>,
) -> Vec<(U256, H256)> {
    let mut entries = Vec::with_capacity(count);
    while entries.len() < count {
        let key = U256::from(rng.gen::<u32>());
        if !taken.insert(key) {
            continue;
        }
        let mut value = H256(rng.gen::<[u8; 32]>());
        while value.is_zero() {
            value = H256(rng.gen::<[u8; 32]>());
        }
        entries.push((key, value));
    }
    entries
}
