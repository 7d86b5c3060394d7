//! The forest: an ordered sequence of perfect trees with strictly
//! decreasing heights, committed to by a single root.
//!
//! Insertion mirrors binary counter carry propagation: a new element enters
//! as a height-0 stub and fuses with the rightmost tree while the two have
//! equal height. After `n` inserts the forest holds exactly one tree per
//! set bit of `n`, so its shape depends only on cardinality, never on
//! element values.

use std::collections::BTreeMap;

use canopy_core::{
    root_hash, Element, Error, ExclusionProof, GapBound, Hash, HashAlgorithm, InclusionProof,
    Result, SubtreeWitness,
};

use crate::merge::fuse;
use crate::tree::{Locate, PerfectTree};

/// Below this many items, batch helpers run sequentially.
const PARALLEL_THRESHOLD: usize = 16;

/// An authenticated insert-only multiset backed by a forest of perfect
/// sorted Merkle trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest<E> {
    /// Subtrees in strictly decreasing height order.
    trees: Vec<PerfectTree<E>>,
    cardinality: u64,
    /// Cached forest root.
    root: Hash,
}

impl<E: Element> Default for Forest<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E: Element> Forest<E> {
    /// The empty forest. Its root is the fixed sentinel `H("ROOT:")`.
    pub fn empty() -> Self {
        Self {
            trees: Vec::new(),
            cardinality: 0,
            root: canopy_core::empty_root(),
        }
    }

    /// Build a forest by inserting every element of `values` in order.
    pub fn from_elements<I>(values: I) -> Self
    where
        I: IntoIterator<Item = E>,
    {
        let mut forest = Self::empty();
        for value in values {
            forest.insert(value);
        }
        forest
    }

    /// Reassemble a forest from subtrees, validating the canonical
    /// invariant (strictly decreasing heights). Used when loading
    /// persisted state.
    pub fn from_trees(trees: Vec<PerfectTree<E>>) -> Result<Self> {
        for pair in trees.windows(2) {
            if pair[0].height() <= pair[1].height() {
                return Err(Error::invalid_input(format!(
                    "non-canonical forest: height {} followed by {}",
                    pair[0].height(),
                    pair[1].height()
                )));
            }
        }
        let cardinality = trees.iter().map(|t| t.cardinality()).sum();
        let mut forest = Self {
            trees,
            cardinality,
            root: canopy_core::empty_root(),
        };
        forest.recompute_root();
        Ok(forest)
    }

    fn recompute_root(&mut self) {
        let roots: Vec<Hash> = self.trees.iter().map(|t| t.root()).collect();
        self.root = root_hash(roots.iter());
    }

    /// Insert an element.
    ///
    /// The element enters as a height-0 stub; while the two rightmost
    /// trees share a height they fuse, exactly like a carry rippling
    /// through a binary counter.
    pub fn insert(&mut self, element: E) {
        let mut acc = PerfectTree::single(element);
        while self.trees.last().map(|t| t.height()) == Some(acc.height()) {
            let top = self.trees.pop().expect("non-empty by the loop condition");
            acc = fuse(top, acc);
        }
        self.trees.push(acc);
        self.cardinality += 1;
        self.recompute_root();
    }

    /// Union with another forest (multiset sum).
    ///
    /// Works like binary addition over the two forests' height sets: at
    /// each height, two resident trees fuse into a carry; when both
    /// forests contribute a tree *and* a carry arrives, the carry stays at
    /// that height and the residents fuse onward. The rule is symmetric in
    /// the two operands, so pairwise union commutes on roots.
    pub fn merge_with(self, other: Self) -> Self {
        let cardinality = self.cardinality + other.cardinality;
        let mut buckets: BTreeMap<u32, Vec<PerfectTree<E>>> = BTreeMap::new();
        for tree in self.trees.into_iter().chain(other.trees) {
            buckets.entry(tree.height()).or_default().push(tree);
        }

        let mut out: Vec<PerfectTree<E>> = Vec::new();
        let mut carry: Option<PerfectTree<E>> = None;
        let mut height = 0u32;
        while carry.is_some() || !buckets.is_empty() {
            let mut resident = buckets.remove(&height).unwrap_or_default();
            // A carry produced at height h-1 always has height h.
            match (resident.len(), carry.take()) {
                (0, None) => {}
                (0, Some(c)) => out.push(c),
                (1, None) => out.push(resident.pop().expect("len checked")),
                (1, Some(c)) => {
                    let r = resident.pop().expect("len checked");
                    carry = Some(fuse(r, c));
                }
                (2, carried) => {
                    if let Some(c) = carried {
                        out.push(c);
                    }
                    let b = resident.pop().expect("len checked");
                    let a = resident.pop().expect("len checked");
                    carry = Some(fuse(a, b));
                }
                _ => unreachable!("at most one tree per height per forest"),
            }
            height += 1;
        }

        out.reverse();
        let mut forest = Self {
            trees: out,
            cardinality,
            root: canopy_core::empty_root(),
        };
        forest.recompute_root();
        forest
    }

    /// The forest root: the sole public commitment.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// Total number of stored elements (with multiplicity).
    pub fn cardinality(&self) -> u64 {
        self.cardinality
    }

    /// Whether the forest holds no elements.
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    /// Subtree heights, tallest first. Equals the set bits of the
    /// cardinality, highest bit first.
    pub fn heights(&self) -> Vec<u32> {
        self.trees.iter().map(|t| t.height()).collect()
    }

    /// Subtree roots in forest order (tallest first).
    pub fn subtree_roots(&self) -> Vec<Hash> {
        self.trees.iter().map(|t| t.root()).collect()
    }

    /// The subtrees, tallest first.
    pub fn trees(&self) -> &[PerfectTree<E>] {
        &self.trees
    }

    /// Whether the element is present in any subtree.
    pub fn contains(&self, element: &E) -> bool {
        self.trees
            .iter()
            .any(|t| matches!(t.find_element(element), Locate::Found(_)))
    }

    /// Locate the element in every subtree, in forest order.
    pub fn find_location(&self, element: &E) -> Vec<Locate> {
        self.trees.iter().map(|t| t.find_element(element)).collect()
    }

    /// Prove that an element is present.
    ///
    /// Returns `None` for an absent element. With duplicates, the proof
    /// points at the leftmost occurrence in the leftmost subtree holding
    /// one, so repeated calls are deterministic.
    pub fn prove_inclusion(&self, element: &E) -> Option<InclusionProof<E>> {
        for (i, tree) in self.trees.iter().enumerate() {
            if let Locate::Found(index) = tree.find_element(element) {
                let peer_roots = self
                    .trees
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, t)| t.root())
                    .collect();
                return Some(InclusionProof {
                    algorithm: HashAlgorithm::Sha256,
                    value: element.clone(),
                    leaf_hash: element.leaf_hash(),
                    subtree_index: i,
                    path: tree.inclusion_path(index),
                    peer_roots,
                    forest_root: self.root,
                });
            }
        }
        None
    }

    /// Prove that an element is absent.
    ///
    /// Returns `None` if the element is present. The proof carries one
    /// witness per subtree; together they recompute every subtree root and
    /// therefore the forest root.
    pub fn prove_exclusion(&self, target: &E) -> Option<ExclusionProof<E>> {
        if self.trees.is_empty() {
            return Some(ExclusionProof {
                algorithm: HashAlgorithm::Sha256,
                target: target.clone(),
                witnesses: vec![SubtreeWitness::Empty],
                forest_root: self.root,
            });
        }
        let mut witnesses = Vec::with_capacity(self.trees.len());
        for tree in &self.trees {
            let witness = match tree.find_element(target) {
                Locate::Found(_) => return None,
                Locate::BeforeAll => SubtreeWitness::BeforeAll {
                    successor: gap_bound(tree, 0),
                },
                Locate::AfterAll => SubtreeWitness::AfterAll {
                    predecessor: gap_bound(tree, tree.cardinality() - 1),
                },
                Locate::GapBetween(below, above) => SubtreeWitness::Between {
                    predecessor: gap_bound(tree, below),
                    successor: gap_bound(tree, above),
                },
            };
            witnesses.push(witness);
        }
        Some(ExclusionProof {
            algorithm: HashAlgorithm::Sha256,
            target: target.clone(),
            witnesses,
            forest_root: self.root,
        })
    }

    /// Generate inclusion proofs for many elements, in parallel above a
    /// small threshold.
    pub fn prove_inclusion_batch(&self, values: &[E]) -> Vec<Option<InclusionProof<E>>>
    where
        E: Send + Sync,
    {
        use rayon::prelude::*;

        if values.len() < PARALLEL_THRESHOLD {
            return values.iter().map(|v| self.prove_inclusion(v)).collect();
        }
        values.par_iter().map(|v| self.prove_inclusion(v)).collect()
    }

    /// Verify many inclusion proofs against one expected root, in parallel
    /// above a small threshold. Returns `true` only if every proof passes.
    pub fn verify_inclusion_batch(proofs: &[InclusionProof<E>], expected_root: Hash) -> bool
    where
        E: Send + Sync,
    {
        use rayon::prelude::*;

        if proofs.len() < PARALLEL_THRESHOLD {
            return proofs.iter().all(|p| p.verify(expected_root));
        }
        proofs.par_iter().all(|p| p.verify(expected_root))
    }
}

fn gap_bound<E: Element>(tree: &PerfectTree<E>, index: u64) -> GapBound<E> {
    GapBound {
        value: tree.elements()[index as usize].clone(),
        path: tree.inclusion_path(index),
    }
}
