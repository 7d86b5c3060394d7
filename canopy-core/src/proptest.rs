//! Property-based tests for hashing and path arithmetic.

use proptest::prelude::*;

use crate::crypto::{leaf_hash, node_hash, root_hash, Hash};
use crate::element::Element;
use crate::proof::{LeafPath, PathNode, Side};

fn arb_hash() -> impl Strategy<Value = Hash> {
    prop::array::uniform32(any::<u8>()).prop_map(Hash::from_bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Leaf hashing is injective in practice: distinct inputs, distinct digests.
    #[test]
    fn prop_leaf_hash_distinct(a in prop::collection::vec(any::<u8>(), 0..64),
                               b in prop::collection::vec(any::<u8>(), 0..64)) {
        prop_assume!(a != b);
        prop_assert_ne!(leaf_hash(&a), leaf_hash(&b));
    }

    /// Node hashing is order-sensitive.
    #[test]
    fn prop_node_hash_order_sensitive(a in arb_hash(), b in arb_hash()) {
        prop_assume!(a != b);
        prop_assert_ne!(node_hash(a, b), node_hash(b, a));
    }

    /// The forest root commits to every subtree root.
    #[test]
    fn prop_root_hash_commits_to_all(roots in prop::collection::vec(arb_hash(), 1..8),
                                     replacement in arb_hash(),
                                     idx in any::<prop::sample::Index>()) {
        let i = idx.index(roots.len());
        prop_assume!(roots[i] != replacement);
        let mut tampered = roots.clone();
        tampered[i] = replacement;
        prop_assert_ne!(root_hash(roots.iter()), root_hash(tampered.iter()));
    }

    /// Side bits and the leaf index carry the same information.
    #[test]
    fn prop_path_index_roundtrip(height in 0u32..16, bits in any::<u64>(), hashes in prop::collection::vec(arb_hash(), 16)) {
        let index = bits & ((1u64 << height) - 1);
        let siblings: Vec<PathNode> = (0..height)
            .map(|depth| PathNode {
                hash: hashes[depth as usize],
                side: if index >> depth & 1 == 1 { Side::Left } else { Side::Right },
            })
            .collect();
        let path = LeafPath { index, siblings };
        prop_assert!(path.is_well_formed());
        prop_assert_eq!(path.implied_index(), index);
    }

    /// Changing any sibling changes the computed root.
    #[test]
    fn prop_path_root_binds_siblings(leaf in arb_hash(),
                                     hashes in prop::collection::vec(arb_hash(), 1..12),
                                     replacement in arb_hash(),
                                     idx in any::<prop::sample::Index>()) {
        let siblings: Vec<PathNode> = hashes.iter()
            .map(|h| PathNode { hash: *h, side: Side::Right })
            .collect();
        let path = LeafPath { index: 0, siblings };
        let i = idx.index(hashes.len());
        prop_assume!(hashes[i] != replacement);
        let mut tampered = path.clone();
        tampered.siblings[i].hash = replacement;
        prop_assert_ne!(path.compute_root(leaf), tampered.compute_root(leaf));
    }

    /// `Ord` agrees with the byte order of the canonical encoding: u64.
    #[test]
    fn prop_element_order_matches_encoding_u64(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(a.cmp(&b), a.canonical_bytes().cmp(&b.canonical_bytes()));
    }

    /// `Ord` agrees with the byte order of the canonical encoding: String.
    #[test]
    fn prop_element_order_matches_encoding_string(a in ".{0,24}", b in ".{0,24}") {
        prop_assert_eq!(a.cmp(&b), a.canonical_bytes().cmp(&b.canonical_bytes()));
    }

    /// `Ord` agrees with the byte order of the canonical encoding: bytes.
    #[test]
    fn prop_element_order_matches_encoding_bytes(
        a in prop::collection::vec(any::<u8>(), 0..24),
        b in prop::collection::vec(any::<u8>(), 0..24),
    ) {
        prop_assert_eq!(a.cmp(&b), a.canonical_bytes().cmp(&b.canonical_bytes()));
    }
}
