//! Cryptographic primitives for Canopy.
//!
//! All hashing is SHA-256 with domain separation: leaf, internal-node and
//! forest-root inputs are prefixed with `"LEAF:"`, `"NODE:"` and `"ROOT:"`
//! respectively, so a digest produced at one level of the structure can
//! never be confused with one produced at another.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Domain prefix for leaf hashes.
pub const LEAF_PREFIX: &[u8] = b"LEAF:";
/// Domain prefix for internal node hashes.
pub const NODE_PREFIX: &[u8] = b"NODE:";
/// Domain prefix for the forest root hash.
pub const ROOT_PREFIX: &[u8] = b"ROOT:";

/// Identifier of the hash primitive, carried in proofs and tree files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte digests).
    Sha256,
}

impl HashAlgorithm {
    /// Numeric identifier used in on-disk headers.
    pub fn id(self) -> u8 {
        match self {
            HashAlgorithm::Sha256 => 1,
        }
    }

    /// Look up an algorithm by its on-disk identifier.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(HashAlgorithm::Sha256),
            other => Err(Error::invalid_input(format!(
                "unknown hash algorithm id {}",
                other
            ))),
        }
    }

    /// Digest width in bytes.
    pub fn width(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => Hash::WIDTH,
        }
    }
}

/// A 32-byte hash value.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Digest width in bytes.
    pub const WIDTH: usize = 32;

    /// Create a hash from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a hash from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::invalid_hash(format!("expected {} bytes, got {}", Self::WIDTH, bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash an element's canonical encoding: `SHA-256("LEAF:" || encoded)`.
pub fn leaf_hash(encoded: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_PREFIX);
    hasher.update(encoded);
    Hash(hasher.finalize().into())
}

/// Hash two child hashes into a parent: `SHA-256("NODE:" || left || right)`.
pub fn node_hash(left: Hash, right: Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(NODE_PREFIX);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash(hasher.finalize().into())
}

/// Hash an ordered sequence of subtree roots into the forest root:
/// `SHA-256("ROOT:" || r_0 || r_1 || …)`.
///
/// An empty sequence yields the empty-forest sentinel, `SHA-256("ROOT:")`.
pub fn root_hash<'a, I>(roots: I) -> Hash
where
    I: IntoIterator<Item = &'a Hash>,
{
    let mut hasher = Sha256::new();
    hasher.update(ROOT_PREFIX);
    for root in roots {
        hasher.update(root.as_bytes());
    }
    Hash(hasher.finalize().into())
}

/// The root committed to by an empty forest.
pub fn empty_root() -> Hash {
    root_hash([])
}
