//! Merging two equal-height trees into one a level taller.
//!
//! The general path is a two-way element-sorted merge streamed through the
//! post-order builder. When the left tree's largest element does not exceed
//! the right tree's smallest, the trees' node arrays are concatenated
//! as-is and the only new hash computed is the parent of the two old roots
//! (post-order of the combined tree is `post(left) ++ post(right) ++ root`).

use canopy_core::{node_hash, Element, Error, Result};

use crate::tree::{PerfectTree, TreeBuilder};

/// Merge two trees of equal height `k` into one of height `k + 1`.
///
/// Returns an error if the heights differ. The inputs are consumed; the
/// result's leaves are the sorted union of both inputs' leaves. When the
/// inputs were already ordered end-to-end, the new root is
/// `node_hash(a.root, b.root)` by construction.
pub fn merge<E: Element>(a: PerfectTree<E>, b: PerfectTree<E>) -> Result<PerfectTree<E>> {
    if a.height() != b.height() {
        return Err(Error::invalid_input(format!(
            "cannot merge trees of heights {} and {}",
            a.height(),
            b.height()
        )));
    }
    Ok(fuse(a, b))
}

/// Equal-height merge; the caller guarantees the height pre-condition.
pub(crate) fn fuse<E: Element>(a: PerfectTree<E>, b: PerfectTree<E>) -> PerfectTree<E> {
    debug_assert_eq!(a.height(), b.height());
    let height = a.height() + 1;

    // Concatenation path: all of `a` precedes all of `b`.
    if a.max() <= b.min() {
        let root = node_hash(a.root(), b.root());
        let (mut elements, mut nodes) = a.into_parts();
        let (b_elements, b_nodes) = b.into_parts();
        elements.extend(b_elements);
        nodes.extend(b_nodes);
        nodes.push(root);
        return PerfectTree::from_raw_parts(height, elements, nodes, root);
    }

    // Sorted path: two-way merge by element order, equal elements taken
    // from the left stream first.
    let cardinality = a.cardinality() + b.cardinality();
    let mut merged = Vec::with_capacity(cardinality as usize);
    let mut left = a.into_parts().0.into_iter().peekable();
    let mut right = b.into_parts().0.into_iter().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => {
                if l <= r {
                    merged.push(left.next().expect("peeked"));
                } else {
                    merged.push(right.next().expect("peeked"));
                }
            }
            (Some(_), None) => merged.push(left.next().expect("peeked")),
            (None, Some(_)) => merged.push(right.next().expect("peeked")),
            (None, None) => break,
        }
    }

    let mut builder = TreeBuilder::with_capacity(cardinality);
    for element in &merged {
        builder.push_leaf(element.leaf_hash());
    }
    let (nodes, root) = builder.finish(height);
    PerfectTree::from_raw_parts(height, merged, nodes, root)
}
