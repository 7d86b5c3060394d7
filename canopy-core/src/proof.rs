//! Proof types for Canopy.
//!
//! An inclusion proof shows that an element is a leaf of one subtree and
//! carries every other subtree's root, so the verifier can rebuild the
//! forest root from nothing but the proof and the element. An exclusion
//! proof carries one absence witness per subtree; since every subtree root
//! is recomputed from its witness, no separate peer-root list is needed.
//!
//! Verifiers return `bool`. A structurally broken proof (side bits that
//! contradict the claimed leaf index, mismatched path lengths, an empty
//! witness in a non-empty forest) verifies as `false` rather than erroring.

use serde::{Deserialize, Serialize};

use crate::crypto::{empty_root, node_hash, root_hash, Hash, HashAlgorithm};
use crate::element::Element;

/// Maximum supported subtree height; bounds the `1 << height` arithmetic.
const MAX_HEIGHT: usize = 63;

/// Side of a sibling relative to the path being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Sibling is on the left; the path node is a right child.
    Left,
    /// Sibling is on the right; the path node is a left child.
    Right,
}

/// A sibling hash on the path from a leaf to its subtree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNode {
    /// Hash of the sibling node.
    pub hash: Hash,
    /// Which side the sibling is on.
    pub side: Side,
}

/// A subtree-local authentication path: the leaf's index and the sibling
/// hashes from the deepest level up to (but excluding) the subtree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafPath {
    /// Index of the leaf within the subtree, counted from the left.
    pub index: u64,
    /// Sibling hashes, deepest first.
    pub siblings: Vec<PathNode>,
}

impl LeafPath {
    /// Height of the subtree this path belongs to.
    pub fn height(&self) -> u32 {
        self.siblings.len() as u32
    }

    /// Number of leaves in the subtree this path belongs to.
    pub fn leaf_count(&self) -> u64 {
        1u64 << self.siblings.len()
    }

    /// The leaf index implied by the side bits alone.
    ///
    /// A left sibling at depth `j` means the path node is a right child
    /// there, i.e. bit `j` of the index is set.
    pub fn implied_index(&self) -> u64 {
        self.siblings
            .iter()
            .enumerate()
            .fold(0u64, |acc, (depth, node)| match node.side {
                Side::Left => acc | (1u64 << depth),
                Side::Right => acc,
            })
    }

    /// Structural validity: a representable height and side bits that
    /// agree with the claimed index. Adjacency arguments in exclusion
    /// proofs lean on this binding.
    pub fn is_well_formed(&self) -> bool {
        self.siblings.len() <= MAX_HEIGHT && self.index == self.implied_index()
    }

    /// Fold the path upward from a leaf hash to the subtree root.
    pub fn compute_root(&self, leaf: Hash) -> Hash {
        let mut current = leaf;
        for node in &self.siblings {
            current = match node.side {
                Side::Left => node_hash(node.hash, current),
                Side::Right => node_hash(current, node.hash),
            };
        }
        current
    }
}

/// Proof that an element is present in the multiset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof<E> {
    /// Hash primitive the proof was generated with.
    pub algorithm: HashAlgorithm,
    /// The element being proved.
    pub value: E,
    /// Leaf hash of the element.
    pub leaf_hash: Hash,
    /// Which subtree (in forest order, tallest first) holds the leaf.
    pub subtree_index: usize,
    /// Authentication path within that subtree.
    pub path: LeafPath,
    /// Roots of all other subtrees, in forest order.
    pub peer_roots: Vec<Hash>,
    /// Forest root at generation time.
    pub forest_root: Hash,
}

impl<E: Element> InclusionProof<E> {
    /// Verify this proof against an expected forest root.
    pub fn verify(&self, expected_root: Hash) -> bool {
        if self.value.leaf_hash() != self.leaf_hash {
            return false;
        }
        if !self.path.is_well_formed() || self.subtree_index > self.peer_roots.len() {
            return false;
        }
        let subtree_root = self.path.compute_root(self.leaf_hash);
        let mut roots: Vec<&Hash> = self.peer_roots.iter().collect();
        roots.insert(self.subtree_index, &subtree_root);
        root_hash(roots.into_iter()) == expected_root
    }
}

/// One end of an absence gap: a proven leaf bracketing the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapBound<E> {
    /// The bracketing element.
    pub value: E,
    /// Its authentication path within the subtree.
    pub path: LeafPath,
}

impl<E: Element> GapBound<E> {
    fn compute_root(&self) -> Hash {
        self.path.compute_root(self.value.leaf_hash())
    }
}

/// Absence witness for a single subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtreeWitness<E> {
    /// The forest has no subtrees at all (empty multiset).
    Empty,
    /// The target sorts before every leaf; the leftmost leaf is proven.
    BeforeAll {
        /// The subtree's smallest element and its path (leaf index 0).
        successor: GapBound<E>,
    },
    /// The target sorts after every leaf; the rightmost leaf is proven.
    AfterAll {
        /// The subtree's largest element and its path (last leaf index).
        predecessor: GapBound<E>,
    },
    /// Two adjacent leaves bracket the target.
    Between {
        /// The leaf just below the target.
        predecessor: GapBound<E>,
        /// The leaf just above the target; its index must be the
        /// predecessor's plus one.
        successor: GapBound<E>,
    },
}

impl<E: Element> SubtreeWitness<E> {
    /// Check the witness's ordering and adjacency conditions against the
    /// target and return the subtree root it authenticates, or `None` if
    /// any condition fails. `Empty` never yields a root; the proof-level
    /// verifier handles it.
    fn subtree_root(&self, target: &E) -> Option<Hash> {
        match self {
            SubtreeWitness::Empty => None,
            SubtreeWitness::BeforeAll { successor } => {
                if !successor.path.is_well_formed() || successor.path.index != 0 {
                    return None;
                }
                if *target >= successor.value {
                    return None;
                }
                Some(successor.compute_root())
            }
            SubtreeWitness::AfterAll { predecessor } => {
                if !predecessor.path.is_well_formed() {
                    return None;
                }
                if predecessor.path.index != predecessor.path.leaf_count() - 1 {
                    return None;
                }
                if *target <= predecessor.value {
                    return None;
                }
                Some(predecessor.compute_root())
            }
            SubtreeWitness::Between {
                predecessor,
                successor,
            } => {
                if !predecessor.path.is_well_formed() || !successor.path.is_well_formed() {
                    return None;
                }
                // Both paths must live in the same subtree, and the two
                // leaves must be neighbors; adjacency is what rules out
                // anything hiding between them.
                if predecessor.path.height() != successor.path.height() {
                    return None;
                }
                if successor.path.index != predecessor.path.index + 1 {
                    return None;
                }
                if predecessor.value >= *target || *target >= successor.value {
                    return None;
                }
                let root = predecessor.compute_root();
                if successor.compute_root() != root {
                    return None;
                }
                Some(root)
            }
        }
    }
}

/// Proof that an element is absent from the multiset: one witness per
/// subtree, in forest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionProof<E> {
    /// Hash primitive the proof was generated with.
    pub algorithm: HashAlgorithm,
    /// The element being proved absent.
    pub target: E,
    /// One absence witness per subtree, tallest subtree first.
    pub witnesses: Vec<SubtreeWitness<E>>,
    /// Forest root at generation time.
    pub forest_root: Hash,
}

impl<E: Element> ExclusionProof<E> {
    /// Verify this proof against an expected forest root.
    pub fn verify(&self, expected_root: Hash) -> bool {
        // A single Empty witness is the whole story for the empty forest.
        if self.witnesses.len() == 1 && matches!(self.witnesses[0], SubtreeWitness::Empty) {
            return expected_root == empty_root();
        }
        if self.witnesses.is_empty() {
            return false;
        }
        let mut roots = Vec::with_capacity(self.witnesses.len());
        for witness in &self.witnesses {
            match witness.subtree_root(&self.target) {
                Some(root) => roots.push(root),
                None => return false,
            }
        }
        root_hash(roots.iter()) == expected_root
    }
}
