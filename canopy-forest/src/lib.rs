//! Merkle Merge Tree: a forest of perfect sorted Merkle trees.
//!
//! The forest is an authenticated insert-only multiset that answers both
//! membership questions against a single compact commitment:
//! - inclusion: *is element `e` present?*
//! - exclusion: *is element `e` absent?*
//!
//! Both answers come with proofs verifiable by a party holding only the
//! forest root, each logarithmic (inclusion) or log-squared (exclusion) in
//! the multiset's cardinality.
//!
//! Every subtree keeps its leaves sorted by element order, which is what
//! makes exclusion provable: two adjacent leaves bracketing the target
//! rule it out of that subtree, and one witness per subtree rules it out
//! of the whole forest.
//!
//! # Example
//!
//! ```rust
//! use canopy_forest::Forest;
//!
//! let mut forest: Forest<u64> = Forest::empty();
//! for value in [10, 25, 40, 55] {
//!     forest.insert(value);
//! }
//!
//! let root = forest.root();
//!
//! let inclusion = forest.prove_inclusion(&25).expect("present");
//! assert!(inclusion.verify(root));
//!
//! let exclusion = forest.prove_exclusion(&33).expect("absent");
//! assert!(exclusion.verify(root));
//! ```

mod forest;
mod merge;
mod tree;

#[cfg(test)]
mod proptest;

pub use forest::Forest;
pub use merge::merge;
pub use tree::{Locate, PerfectTree};
