// Copyright (c) Kanari Network
// SPDX-License-Identifier: Apache-2.0

use super::SmtError;
use super::bit_path::BitPath;
use super::test_helper::path;
use primitive_types::U256;
use proptest::prelude::*;

#[test]
fn test_from_key() {
    let p = BitPath::from_key(U256::from(0b0101u64), 4).unwrap();
    assert_eq!(p, path("0101"));
    assert_eq!(p.len(), 4);
    assert_eq!(p.to_string(), "0101");
    assert!(!p.bit(0));
    assert!(p.bit(1));
    assert!(p.last_bit());

    assert_eq!(
        BitPath::from_key(U256::zero(), 4).unwrap(),
        path("0000")
    );
    assert_eq!(
        BitPath::from_key(U256::from(255u64), 8).unwrap(),
        path("11111111")
    );
}

#[test]
fn test_from_key_out_of_range() {
    let err = BitPath::from_key(U256::from(16u64), 4).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SmtError>(),
        Some(&SmtError::InvalidKey {
            key: U256::from(16u64),
            depth: 4
        })
    );
    // The full 256-bit key space has no out-of-range keys.
    BitPath::from_key(U256::MAX, 256).unwrap();
}

#[test]
fn test_parent_sibling_child() {
    let p = path("0101");
    assert_eq!(p.parent(), path("010"));
    assert_eq!(p.sibling(), path("0100"));
    assert_eq!(p.child(true), path("01011"));
    assert_eq!(p.child(false), path("01010"));
    assert_eq!(p.prefix(2), path("01"));
    assert_eq!(p.prefix(0), BitPath::root());
    assert_eq!(path("1").parent(), BitPath::root());

    // Crossing a byte boundary keeps the padding canonical.
    let long = path("111111111");
    assert_eq!(long.parent(), path("11111111"));
    assert_eq!(long.parent().child(true), long);
    assert_eq!(long.sibling(), path("111111110"));
}

#[test]
fn test_prefix_relation() {
    assert!(path("01").is_strict_prefix_of(&path("0101")));
    assert!(path("0").is_strict_prefix_of(&path("01")));
    assert!(BitPath::root().is_strict_prefix_of(&path("1")));
    assert!(!path("01").is_strict_prefix_of(&path("01")));
    assert!(!path("01").is_strict_prefix_of(&path("001")));
    assert!(!path("0101").is_strict_prefix_of(&path("01")));
    assert!(!path("11").is_strict_prefix_of(&path("101")));
}

#[test]
fn test_ordering_is_prefix_first() {
    // A prefix sorts immediately before its extensions, extensions before
    // anything that diverges upward.
    let mut paths = vec![
        path("1"),
        path("0101"),
        path("01"),
        path("0011"),
        path("0"),
        path("0100"),
        path("10"),
    ];
    paths.sort();
    assert_eq!(
        paths,
        vec![
            path("0"),
            path("0011"),
            path("01"),
            path("0100"),
            path("0101"),
            path("1"),
            path("10"),
        ]
    );
}

#[test]
fn test_to_u256() {
    assert_eq!(BitPath::root().to_u256(), U256::zero());
    assert_eq!(path("0101").to_u256(), U256::from(5u64));
    assert_eq!(path("0011").to_u256(), U256::from(3u64));
    assert_eq!(path("1").to_u256(), U256::one());
    assert_eq!(path("100000000").to_u256(), U256::from(256u64));
}

proptest! {
    #[test]
    fn test_key_round_trip(key in any::<u32>()) {
        let p = BitPath::from_key(U256::from(key), 32).unwrap();
        prop_assert_eq!(p.len(), 32);
        prop_assert_eq!(p.to_u256(), U256::from(key));
    }

    #[test]
    fn test_sibling_is_an_involution(key in any::<u32>(), len in 1usize..=32) {
        let p = BitPath::from_key(U256::from(key), 32).unwrap().prefix(len);
        prop_assert_ne!(p.sibling(), p.clone());
        prop_assert_eq!(p.sibling().sibling(), p.clone());
        prop_assert_eq!(p.sibling().parent(), p.parent());
    }
}
