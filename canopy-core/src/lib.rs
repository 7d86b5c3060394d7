//! Canopy Core - Fundamental types for the Canopy authenticated multiset.
//!
//! This crate provides the building blocks shared by the forest engine and
//! the storage layer:
//!
//! - [`crypto`] - domain-separated SHA-256 hashing and the [`Hash`] newtype
//! - [`element`] - the [`Element`] trait (total order + canonical encoding)
//! - [`proof`] - inclusion and exclusion proofs, with verification
//! - [`error`] - structured errors with codes
//!
//! # Example
//!
//! ```rust
//! use canopy_core::{node_hash, root_hash, Element};
//!
//! // A two-leaf tree committed to by a single-subtree forest root.
//! let a = 1u64.leaf_hash();
//! let b = 2u64.leaf_hash();
//! let tree_root = node_hash(a, b);
//! let forest_root = root_hash([&tree_root]);
//! assert_ne!(forest_root, tree_root);
//! ```

pub mod crypto;
pub mod element;
pub mod error;
pub mod proof;

#[cfg(test)]
mod proptest;

// Re-exports for convenience
pub use crypto::{
    empty_root, leaf_hash, node_hash, root_hash, Hash, HashAlgorithm, LEAF_PREFIX, NODE_PREFIX,
    ROOT_PREFIX,
};
pub use element::Element;
pub use error::{Error, ErrorCode, Result};
pub use proof::{
    ExclusionProof, GapBound, InclusionProof, LeafPath, PathNode, Side, SubtreeWitness,
};
