//! The element trait: what a value must provide to live in the multiset.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::{self, Hash};

/// A value storable in the multiset.
///
/// The engine needs exactly two things from an element: a canonical byte
/// encoding (the hashing input) and a total order over those encodings
/// (used to sort leaves and to decide gap placement in exclusion proofs).
/// The `Ord` impl *is* that order: implementors must guarantee
///
/// ```text
/// a.cmp(b) == a.canonical_bytes().cmp(&b.canonical_bytes())
/// ```
///
/// for all values. An `Ord` that disagrees with the byte order of the
/// encoding breaks the sorted-leaf invariant that exclusion proofs rest
/// on. In particular, equal elements must encode identically.
pub trait Element: Ord + Clone + Serialize + DeserializeOwned {
    /// The canonical byte encoding of this element.
    ///
    /// The byte order of this encoding must agree with `Ord` (see the
    /// trait docs); the digest of this encoding is the element's leaf
    /// hash.
    fn canonical_bytes(&self) -> Vec<u8>;

    /// The domain-separated leaf hash of this element.
    fn leaf_hash(&self) -> Hash {
        crypto::leaf_hash(&self.canonical_bytes())
    }
}

impl Element for Vec<u8> {
    fn canonical_bytes(&self) -> Vec<u8> {
        self.clone()
    }
}

impl Element for String {
    fn canonical_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Element for u64 {
    // Big-endian so that byte order agrees with numeric order.
    fn canonical_bytes(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}
