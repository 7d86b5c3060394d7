//! Property-based tests for forest operations.
//!
//! Tests invariants of the Merkle Merge Tree under arbitrary insertions.

use proptest::prelude::*;

use crate::Forest;

fn arb_values(max_count: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<u64>(), 0..max_count)
}

// ============================================================================
// Property Tests: Shape
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// After n inserts the subtree heights equal the set bits of n.
    #[test]
    fn prop_shape_matches_set_bits(values in arb_values(200)) {
        let forest = Forest::from_elements(values.iter().copied());
        let n = values.len() as u64;
        let expected: Vec<u32> = (0..64u32).rev()
            .filter(|bit| n >> bit & 1 == 1)
            .collect();
        prop_assert_eq!(forest.heights(), expected);
        prop_assert_eq!(forest.cardinality(), n);
    }

    /// Every subtree's leaves are weakly sorted.
    #[test]
    fn prop_subtrees_sorted(values in arb_values(150)) {
        let forest = Forest::from_elements(values.iter().copied());
        for tree in forest.trees() {
            prop_assert!(tree.elements().windows(2).all(|w| w[0] <= w[1]));
        }
    }

    /// The same insertion sequence always produces the same root.
    #[test]
    fn prop_root_deterministic(values in arb_values(100)) {
        let a = Forest::from_elements(values.iter().copied());
        let b = Forest::from_elements(values.iter().copied());
        prop_assert_eq!(a.root(), b.root());
    }

    /// Insertion order shows through the root once subtree contents
    /// depend on epoch: with three distinct values, front-loading a
    /// different pair fills the height-1 tree differently.
    #[test]
    fn prop_insert_order_matters_at_three(a in any::<u64>(), b in any::<u64>(), c in any::<u64>()) {
        prop_assume!(a != b && b != c && a != c);
        let abc = Forest::from_elements([a, b, c]);
        let cba = Forest::from_elements([c, b, a]);
        prop_assert_eq!(abc.heights(), cba.heights());
        prop_assert_ne!(abc.root(), cba.root());
    }
}

// ============================================================================
// Property Tests: Proofs
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every inserted element has a verifying inclusion proof.
    #[test]
    fn prop_all_elements_provable(values in arb_values(100)) {
        let forest = Forest::from_elements(values.iter().copied());
        for value in &values {
            let proof = forest.prove_inclusion(value);
            let proof = proof.expect("inserted element must be provable");
            prop_assert!(proof.verify(forest.root()));
        }
    }

    /// Every absent element has a verifying exclusion proof and no
    /// inclusion proof.
    #[test]
    fn prop_absent_elements_excludable(values in arb_values(100), probe in any::<u64>()) {
        let forest = Forest::from_elements(values.iter().copied());
        prop_assume!(!values.contains(&probe));
        prop_assert!(forest.prove_inclusion(&probe).is_none());
        let proof = forest.prove_exclusion(&probe).expect("absent element must be excludable");
        prop_assert!(proof.verify(forest.root()));
    }

    /// Present elements have no exclusion proof.
    #[test]
    fn prop_present_elements_not_excludable(values in arb_values(60), pick in any::<prop::sample::Index>()) {
        prop_assume!(!values.is_empty());
        let forest = Forest::from_elements(values.iter().copied());
        let present = values[pick.index(values.len())];
        prop_assert!(forest.prove_exclusion(&present).is_none());
    }

    /// Inclusion proofs are logarithmic: the path never exceeds the
    /// tallest subtree's height.
    #[test]
    fn prop_proof_size_logarithmic(n in 1usize..512) {
        let forest = Forest::from_elements((0..n as u64).map(|i| i * 7));
        let proof = forest.prove_inclusion(&0).expect("present");
        let max_height = 64 - (n as u64).leading_zeros();
        prop_assert!(proof.path.siblings.len() <= max_height as usize);
        prop_assert!(proof.peer_roots.len() < 64);
    }

    /// An exclusion proof carries exactly one witness per subtree.
    #[test]
    fn prop_exclusion_covers_every_subtree(values in arb_values(100), probe in any::<u64>()) {
        let forest = Forest::from_elements(values.iter().copied());
        prop_assume!(!values.contains(&probe) && !values.is_empty());
        let proof = forest.prove_exclusion(&probe).expect("absent");
        prop_assert_eq!(proof.witnesses.len(), forest.trees().len());
    }
}

// ============================================================================
// Property Tests: Union
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Union is commutative on roots.
    #[test]
    fn prop_union_commutes(left in arb_values(60), right in arb_values(60)) {
        let a = Forest::from_elements(left.iter().copied());
        let b = Forest::from_elements(right.iter().copied());
        let ab = a.clone().merge_with(b.clone());
        let ba = b.merge_with(a);
        prop_assert_eq!(ab.root(), ba.root());
    }

    /// Building by merging singleton forests is insensitive to merge
    /// order and association: with a power-of-two element count every
    /// fold funnels the whole multiset into one sorted tree, so a linear
    /// fold and a reversed balanced fold agree on the root. Sequential
    /// insertion of the same multiset does not have this property —
    /// subtree contents depend on insertion epoch, so permuting the
    /// inserts moves the root. The asymmetry is intended behavior.
    #[test]
    fn prop_singleton_merges_agree_sequential_inserts_do_not(
        k in 0u32..4,
        seed in prop::collection::vec(any::<u64>(), 16),
    ) {
        let values = &seed[..1usize << k];

        let linear = values
            .iter()
            .map(|v| Forest::from_elements([*v]))
            .reduce(Forest::merge_with)
            .expect("at least one element");

        let mut layer: Vec<Forest<u64>> = values
            .iter()
            .rev()
            .map(|v| Forest::from_elements([*v]))
            .collect();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len() / 2);
            let mut pairs = layer.into_iter();
            while let (Some(a), Some(b)) = (pairs.next(), pairs.next()) {
                next.push(a.merge_with(b));
            }
            layer = next;
        }
        let balanced = layer.pop().expect("one forest left");

        prop_assert_eq!(linear.root(), balanced.root());

        // The contrast: permuting sequential inserts changes the root as
        // soon as three distinct elements are involved.
        let mut distinct = seed.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assume!(distinct.len() >= 3);
        let forward = Forest::from_elements([distinct[0], distinct[1], distinct[2]]);
        let backward = Forest::from_elements([distinct[2], distinct[1], distinct[0]]);
        prop_assert_ne!(forward.root(), backward.root());
    }

    /// Union preserves cardinality and membership, and stays canonical.
    #[test]
    fn prop_union_is_multiset_sum(left in arb_values(60), right in arb_values(60)) {
        let a = Forest::from_elements(left.iter().copied());
        let b = Forest::from_elements(right.iter().copied());
        let union = a.merge_with(b);
        prop_assert_eq!(union.cardinality(), (left.len() + right.len()) as u64);
        for value in left.iter().chain(right.iter()) {
            prop_assert!(union.contains(value));
        }
        let n = union.cardinality();
        let expected: Vec<u32> = (0..64u32).rev()
            .filter(|bit| n >> bit & 1 == 1)
            .collect();
        prop_assert_eq!(union.heights(), expected);
    }

    /// Proofs generated from a union verify against the union root.
    #[test]
    fn prop_union_proofs_verify(left in arb_values(40), right in arb_values(40), probe in any::<u64>()) {
        let union = Forest::from_elements(left.iter().copied())
            .merge_with(Forest::from_elements(right.iter().copied()));
        if union.contains(&probe) {
            let proof = union.prove_inclusion(&probe).expect("present");
            prop_assert!(proof.verify(union.root()));
        } else {
            let proof = union.prove_exclusion(&probe).expect("absent");
            prop_assert!(proof.verify(union.root()));
        }
    }
}

// ============================================================================
// Property Tests: Tamper Detection
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Changing the proven value breaks verification.
    #[test]
    fn prop_tampered_value_fails(values in arb_values(60), replacement in any::<u64>()) {
        prop_assume!(!values.is_empty());
        let forest = Forest::from_elements(values.iter().copied());
        let mut proof = forest.prove_inclusion(&values[0]).expect("present");
        prop_assume!(replacement != proof.value);
        proof.value = replacement;
        prop_assert!(!proof.verify(forest.root()));
    }

    /// Changing any sibling hash breaks verification.
    #[test]
    fn prop_tampered_sibling_fails(n in 4u64..64, pick in any::<prop::sample::Index>()) {
        let forest = Forest::from_elements((0..n).map(|i| i * 11));
        let mut proof = forest.prove_inclusion(&0).expect("present");
        prop_assume!(!proof.path.siblings.is_empty());
        let i = pick.index(proof.path.siblings.len());
        proof.path.siblings[i].hash = canopy_core::leaf_hash(b"tampered");
        prop_assert!(!proof.verify(forest.root()));
    }

    /// A proof generated before an insert fails against the new root.
    #[test]
    fn prop_stale_proof_fails(values in arb_values(60), extra in any::<u64>()) {
        prop_assume!(!values.is_empty());
        let mut forest = Forest::from_elements(values.iter().copied());
        let proof = forest.prove_inclusion(&values[0]).expect("present");
        forest.insert(extra);
        prop_assert!(!proof.verify(forest.root()));
    }
}
