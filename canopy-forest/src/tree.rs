//! Perfect sorted Merkle trees.
//!
//! A [`PerfectTree`] holds exactly `2^k` elements in weakly sorted order.
//! Its node hashes live in a single dense array in post-order: every leaf
//! precedes its parent and every subtree is fully emitted before its right
//! sibling. For a height-3 tree with leaves `1..8` and intermediates
//! `a..g`:
//!
//! ```text
//! 1 2 a 3 4 c b 5 6 e 7 8 g f d
//! ```
//!
//! The root is the last entry. The layout is what makes merges sequential:
//! two trees can be streamed leaf-by-leaf while parents are emitted as soon
//! as both children exist.

use serde::{Deserialize, Serialize};

use canopy_core::{node_hash, Element, Error, Hash, LeafPath, PathNode, Result, Side};

/// Where an element sits (or would sit) among a tree's sorted leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locate {
    /// The element is present at this leaf index (leftmost occurrence).
    Found(u64),
    /// The element falls strictly between these two adjacent leaves.
    GapBetween(u64, u64),
    /// The element sorts before every leaf.
    BeforeAll,
    /// The element sorts after every leaf.
    AfterAll,
}

/// Post-order position of leaf `i`: `2i - popcount(i)`.
///
/// Leaf 0 sits at node 0, leaf 1 at node 1 (parent at 2), leaf 2 at
/// node 3, leaf 4 at node 7, and so on.
pub(crate) fn leaf_node_pos(i: u64) -> usize {
    (2 * i - u64::from(i.count_ones())) as usize
}

/// Streaming bottom-up builder for the post-order node array.
///
/// Push leaves left to right; after leaf `i` is pushed, one parent is
/// emitted per trailing one bit of `i`, which is exactly when both of a
/// parent's children have been seen.
pub(crate) struct TreeBuilder {
    nodes: Vec<Hash>,
    stack: Vec<Hash>,
    count: u64,
}

impl TreeBuilder {
    pub(crate) fn with_capacity(leaves: u64) -> Self {
        Self {
            nodes: Vec::with_capacity((2 * leaves).saturating_sub(1) as usize),
            stack: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn push_leaf(&mut self, leaf: Hash) {
        let i = self.count;
        self.nodes.push(leaf);
        self.stack.push(leaf);
        for _ in 0..i.trailing_ones() {
            let right = self.stack.pop().expect("two children on stack");
            let left = self.stack.pop().expect("two children on stack");
            let parent = node_hash(left, right);
            self.nodes.push(parent);
            self.stack.push(parent);
        }
        self.count += 1;
    }

    /// Finish after exactly `2^height` leaves; returns the node array and
    /// the root.
    pub(crate) fn finish(mut self, height: u32) -> (Vec<Hash>, Hash) {
        debug_assert_eq!(self.count, 1u64 << height);
        debug_assert_eq!(self.stack.len(), 1);
        let root = self.stack.pop().expect("root on stack");
        (self.nodes, root)
    }
}

/// An immutable, complete binary Merkle tree over exactly `2^k` weakly
/// sorted elements.
///
/// A height-0 tree is a single leaf whose root is the leaf hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectTree<E> {
    height: u32,
    elements: Vec<E>,
    nodes: Vec<Hash>,
    root: Hash,
}

impl<E: Element> PerfectTree<E> {
    /// Wrap a single element in a height-0 tree (a stub).
    pub fn single(element: E) -> Self {
        let leaf = element.leaf_hash();
        Self {
            height: 0,
            elements: vec![element],
            nodes: vec![leaf],
            root: leaf,
        }
    }

    /// Build a tree from a weakly sorted element sequence whose length is
    /// a power of two.
    pub fn from_sorted(elements: Vec<E>) -> Result<Self> {
        let n = elements.len() as u64;
        if n == 0 || !n.is_power_of_two() {
            debug_assert!(
                false,
                "non-power-of-two leaf count in PerfectTree::from_sorted"
            );
            return Err(Error::invalid_input(format!(
                "perfect tree needs a power-of-two leaf count, got {}",
                n
            )));
        }
        if elements.windows(2).any(|w| w[0] > w[1]) {
            debug_assert!(false, "unsorted input to PerfectTree::from_sorted");
            return Err(Error::invalid_input("leaf elements are not sorted"));
        }
        let height = n.trailing_zeros();
        let mut builder = TreeBuilder::with_capacity(n);
        for element in &elements {
            builder.push_leaf(element.leaf_hash());
        }
        let (nodes, root) = builder.finish(height);
        Ok(Self {
            height,
            elements,
            nodes,
            root,
        })
    }

    /// Assemble a tree from parts the caller has already validated.
    pub(crate) fn from_raw_parts(height: u32, elements: Vec<E>, nodes: Vec<Hash>, root: Hash) -> Self {
        debug_assert_eq!(elements.len() as u64, 1u64 << height);
        debug_assert_eq!(nodes.len() as u64, (1u64 << (height + 1)) - 1);
        debug_assert_eq!(nodes.last(), Some(&root));
        Self {
            height,
            elements,
            nodes,
            root,
        }
    }

    /// Decompose into the element and node arrays (for merging).
    pub(crate) fn into_parts(self) -> (Vec<E>, Vec<Hash>) {
        (self.elements, self.nodes)
    }

    /// Height `k`; the tree has `2^k` leaves.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of leaves.
    pub fn cardinality(&self) -> u64 {
        1u64 << self.height
    }

    /// The tree's root hash.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// The sorted elements, left to right.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// The full node array in post-order; the root is last.
    pub fn nodes(&self) -> &[Hash] {
        &self.nodes
    }

    /// The smallest element.
    pub fn min(&self) -> &E {
        &self.elements[0]
    }

    /// The largest element.
    pub fn max(&self) -> &E {
        &self.elements[self.elements.len() - 1]
    }

    /// Leaf hash at a leaf index.
    pub fn leaf_hash(&self, index: u64) -> Hash {
        self.nodes[leaf_node_pos(index)]
    }

    /// Iterate leaves as `(element, leaf_hash)` pairs in sorted order.
    pub fn leaves(&self) -> impl Iterator<Item = (&E, Hash)> + '_ {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e, self.leaf_hash(i as u64)))
    }

    /// Locate an element among the sorted leaves. Duplicates resolve to
    /// the leftmost occurrence.
    pub fn find_element(&self, element: &E) -> Locate {
        let i = self.elements.partition_point(|e| e < element);
        if i < self.elements.len() && self.elements[i] == *element {
            return Locate::Found(i as u64);
        }
        if i == 0 {
            Locate::BeforeAll
        } else if i == self.elements.len() {
            Locate::AfterAll
        } else {
            Locate::GapBetween(i as u64 - 1, i as u64)
        }
    }

    /// Authentication path for the leaf at `index`: the `k` sibling hashes
    /// from the deepest level up to the root, excluding both the leaf hash
    /// and the root itself.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn inclusion_path(&self, index: u64) -> LeafPath {
        assert!(index < self.cardinality(), "leaf index out of range");
        let mut siblings = Vec::with_capacity(self.height as usize);
        let mut pos = self.nodes.len() - 1;
        let mut lo = 0u64;
        let mut h = self.height;
        while h > 0 {
            // A subtree rooted at `pos` with height `h` spans 2^(h+1)-1
            // nodes; its right child roots at pos-1, its left child at
            // pos-2^h.
            let right_child = pos - 1;
            let left_child = pos - (1usize << h);
            let half = 1u64 << (h - 1);
            if index < lo + half {
                siblings.push(PathNode {
                    hash: self.nodes[right_child],
                    side: Side::Right,
                });
                pos = left_child;
            } else {
                siblings.push(PathNode {
                    hash: self.nodes[left_child],
                    side: Side::Left,
                });
                lo += half;
                pos = right_child;
            }
            h -= 1;
        }
        siblings.reverse();
        LeafPath { index, siblings }
    }
}
